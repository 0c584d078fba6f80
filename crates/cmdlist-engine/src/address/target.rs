use crate::handle::FramebufferId;
use crate::version::ChangeTracker;

use super::{AddressResolver, AddressTable, DeviceAddress, ResourceId, ResourceKind};

/// Bytes per texel for both the color and the depth attachment.
const TEXEL_BYTES: u64 = 4;

/// Residency bookkeeping for one render target.
///
/// The attachments are registered as texture resources and kept pinned for
/// as long as the target uses them.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    framebuffer: FramebufferId,
    color: ResourceId,
    depth: ResourceId,
    width: u32,
    height: u32,
}

impl RenderTarget {
    pub fn new(table: &mut AddressTable, framebuffer: FramebufferId, width: u32, height: u32) -> Self {
        let (color, depth) = Self::pin_attachments(table, width, height);
        Self {
            framebuffer,
            color,
            depth,
            width,
            height,
        }
    }

    /// Swaps in attachments of a new size.
    ///
    /// The old attachments are unpinned before they are released, the new
    /// ones pinned before their addresses can be used, and the target version
    /// is bumped so compiled replay data gets re-linked.
    pub fn resize(
        &mut self,
        table: &mut AddressTable,
        tracker: &mut ChangeTracker,
        framebuffer: FramebufferId,
        width: u32,
        height: u32,
    ) {
        for old in [self.color, self.depth] {
            table.unpin(old);
            table.release(old);
        }

        let (color, depth) = Self::pin_attachments(table, width, height);
        self.color = color;
        self.depth = depth;
        self.framebuffer = framebuffer;
        self.width = width;
        self.height = height;

        let version = tracker.bump_target();
        log::debug!(
            "render target resized to {width}x{height} ({framebuffer}), target version {}",
            version.target
        );
    }

    #[inline]
    pub fn framebuffer(&self) -> FramebufferId {
        self.framebuffer
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn color_address(&self, table: &AddressTable) -> DeviceAddress {
        table.resolve(self.color)
    }

    pub fn depth_address(&self, table: &AddressTable) -> DeviceAddress {
        table.resolve(self.depth)
    }

    fn pin_attachments(table: &mut AddressTable, width: u32, height: u32) -> (ResourceId, ResourceId) {
        let bytes = u64::from(width.max(1)) * u64::from(height.max(1)) * TEXEL_BYTES;
        let color = table.register(ResourceKind::Texture, bytes);
        let depth = table.register(ResourceKind::Texture, bytes);
        table.pin(color);
        table.pin(depth);
        (color, depth)
    }
}
