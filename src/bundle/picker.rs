//! Egress window picker.
//!
//! The signature space is cut into contiguous windows, one per active link:
//! link `i` (1-based) owns `[width * (i - 1), width * i)` where
//! `width = max_supported_links / active_links`. Signatures above the last
//! window (non-divisible ratios) belong to the last active link.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::{FlowSignature, LinkIndex};

/// Pick the egress link for a flow signature.
///
/// Returns an index in `[1, active_links]`. Fails only with
/// [`Error::NoAvailableLinks`] when no link is up.
pub fn pick_link(
    active_links: u16,
    max_supported_links: u16,
    signature: FlowSignature,
) -> Result<LinkIndex> {
    if active_links == 0 {
        return Err(Error::NoAvailableLinks);
    }

    let width = u32::from(window_width(active_links, max_supported_links));
    if width == 0 {
        // More links up than the bundle is sized for: every window is empty.
        return Ok(LinkIndex(active_links));
    }

    let index = (u32::from(signature.value()) / width + 1).min(u32::from(active_links));
    Ok(LinkIndex(index as u16))
}

/// Number of signature values each active link owns.
pub fn window_width(active_links: u16, max_supported_links: u16) -> u16 {
    max_supported_links.checked_div(active_links).unwrap_or(0)
}

/// Half-open signature range owned by one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub link: LinkIndex,
    pub lower: u32,
    pub upper: u32,
}

impl Window {
    pub fn contains(&self, signature: FlowSignature) -> bool {
        let s = u32::from(signature.value());
        self.lower <= s && s < self.upper
    }

    /// Number of signatures in this window that can actually occur.
    pub fn reachable(&self) -> u32 {
        self.upper.min(FlowSignature::SPACE).saturating_sub(self.lower)
    }
}

/// Window layout for a bundle.
///
/// The last window is stretched to the end of the signature space so the
/// layout covers every signature exactly once.
pub fn window_layout(active_links: u16, max_supported_links: u16) -> Result<Vec<Window>> {
    if active_links == 0 {
        return Err(Error::NoAvailableLinks);
    }

    let width = u32::from(window_width(active_links, max_supported_links));
    let windows = (1..=active_links)
        .map(|i| {
            let lower = width * (u32::from(i) - 1);
            let mut upper = width * u32::from(i);
            if i == active_links {
                upper = upper.max(FlowSignature::SPACE);
            }
            Window {
                link: LinkIndex(i),
                lower,
                upper,
            }
        })
        .collect();

    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_links_fails() {
        assert!(matches!(
            pick_link(0, 256, FlowSignature(10)),
            Err(Error::NoAvailableLinks)
        ));
        assert!(window_layout(0, 256).is_err());
    }

    #[test]
    fn test_even_split() {
        // 256 / 64 = 4 signatures per link
        assert_eq!(pick_link(64, 256, FlowSignature(0)).unwrap(), LinkIndex(1));
        assert_eq!(pick_link(64, 256, FlowSignature(3)).unwrap(), LinkIndex(1));
        assert_eq!(pick_link(64, 256, FlowSignature(4)).unwrap(), LinkIndex(2));
        assert_eq!(pick_link(64, 256, FlowSignature(255)).unwrap(), LinkIndex(64));
    }

    #[test]
    fn test_residual_goes_to_last_link() {
        // 256 / 3 = 85: windows [0,85) [85,170) [170,255), 255 is residual
        assert_eq!(pick_link(3, 256, FlowSignature(84)).unwrap(), LinkIndex(1));
        assert_eq!(pick_link(3, 256, FlowSignature(85)).unwrap(), LinkIndex(2));
        assert_eq!(pick_link(3, 256, FlowSignature(254)).unwrap(), LinkIndex(3));
        assert_eq!(pick_link(3, 256, FlowSignature(255)).unwrap(), LinkIndex(3));
    }

    #[test]
    fn test_more_links_than_capacity() {
        assert_eq!(pick_link(8, 4, FlowSignature(0)).unwrap(), LinkIndex(8));
        assert_eq!(window_width(8, 4), 0);
    }

    #[test]
    fn test_capacity_beyond_signature_space() {
        // 512 / 2 = 256: the whole signature space falls in the first window
        for sig in FlowSignature::all() {
            assert_eq!(pick_link(2, 512, sig).unwrap(), LinkIndex(1));
        }
    }

    #[test]
    fn test_layout_matches_picker() {
        for (active, max) in [(1, 256), (3, 256), (7, 256), (64, 256), (2, 512), (8, 4)] {
            let windows = window_layout(active, max).unwrap();
            assert_eq!(windows.len(), usize::from(active));
            for sig in FlowSignature::all() {
                let owners: Vec<_> = windows.iter().filter(|w| w.contains(sig)).collect();
                assert_eq!(owners.len(), 1, "signature {sig} for {active}/{max}");
                assert_eq!(owners[0].link, pick_link(active, max, sig).unwrap());
            }
            let reachable: u32 = windows.iter().map(Window::reachable).sum();
            assert_eq!(reachable, FlowSignature::SPACE);
        }
    }
}
