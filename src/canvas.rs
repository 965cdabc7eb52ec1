//! I/O interface for canvas drawing functionality.
//!
//! The canvas uses a coordinate system where (0,0) is the top-left corner and every
//! increment of 1 is 1/96 of an inch, so (96, 96) is an inch down and right from the corner.
//! The canvas allows all inputs and never fails: geometry outside the crop area is simply
//! discarded. Scaling affects rendering only, never hitboxes.

use slotmap::{SlotMap, new_key_type};

use crate::geometry::{Color, Rectangle, Vector2};
use crate::image::Image;

new_key_type! {
    /// Key of an image loaded into a canvas.
    pub struct ImageHandle;
}

/// Draw primitives and image management a renderer back-end provides to the tree.
///
/// Cropping and tinting are managed by the traversal: crops nest through
/// `crop_to`/`restore_crop` pairs, and the tint is multiplicative along the tree, set
/// around every node as it draws.
pub trait CanvasIo {
    /// Horizontal and vertical DPI of the output.
    fn dpi(&self) -> Vector2 {
        Vector2::new(96.0, 96.0)
    }

    /// Set the scale applied to everything drawn next. Affects output resolution only;
    /// coordinates and hit testing are unchanged.
    fn set_scale(&mut self, scale: f32);

    fn scale(&self) -> f32;

    /// Limit drawing to the given rectangle, returning the previous limit for
    /// [`restore_crop`](Self::restore_crop).
    fn crop_to(&mut self, rect: Rectangle) -> Option<Rectangle>;

    /// Restore the capability to draw in the previous crop area.
    fn restore_crop(&mut self, previous: Option<Rectangle>);

    /// Set the tint every drawn shape's color is multiplied by. Returns the previous tint;
    /// the traversal stacks tints by restoring it after each branch.
    fn set_tint(&mut self, tint: Color) -> Color;

    fn tint(&self) -> Color;

    fn draw_rectangle(&mut self, rectangle: Rectangle, color: Color);

    fn draw_line(&mut self, start: Vector2, end: Vector2, width: f32, color: Color);

    fn draw_circle(&mut self, center: Vector2, radius: f32, color: Color);

    fn draw_circle_outline(&mut self, center: Vector2, radius: f32, width: f32, color: Color);

    /// Draw a loaded image. The handle must come from [`load_image`](Self::load_image);
    /// drawing marks the image as referenced for the retention sweep.
    fn draw_image(&mut self, handle: ImageHandle, destination: Rectangle, tint: Color);

    /// Like [`draw_image`](Self::draw_image), but aligned to pixel boundaries. Recommended
    /// for text.
    fn draw_hinted_image(&mut self, handle: ImageHandle, destination: Rectangle, tint: Color);

    /// Load an image, returning its handle. Loading the same content twice returns the same
    /// handle.
    fn load_image(&mut self, image: &Image) -> ImageHandle;

    /// Drop an image eagerly, without waiting for the retention sweep.
    fn unload_image(&mut self, handle: ImageHandle);

    /// End the frame: images that went a full frame without being drawn are unloaded.
    fn next_frame(&mut self);
}

struct CachedImage {
    image: Image,
    /// True if the image was drawn since the last sweep.
    used: bool,
    /// Completed frames the image went unreferenced.
    unused_frames: u8,
}

/// Reference-counting-by-presence image storage for canvas implementations.
///
/// An image referenced by any drawn node stays loaded; one that goes a complete frame
/// without being referenced becomes unloadable. The one-frame window lets images survive
/// transient node hides without reupload.
#[derive(Default)]
pub struct ImageCache {
    images: SlotMap<ImageHandle, CachedImage>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an image, deduplicating identical content.
    pub fn load(&mut self, image: &Image) -> ImageHandle {
        let existing = self
            .images
            .iter()
            .find(|(_, cached)| cached.image == *image)
            .map(|(handle, _)| handle);
        if let Some(handle) = existing {
            self.mark_used(handle);
            return handle;
        }
        self.images.insert(CachedImage {
            image: image.clone(),
            used: true,
            unused_frames: 0,
        })
    }

    pub fn unload(&mut self, handle: ImageHandle) {
        self.images.remove(handle);
    }

    /// Record that the image was drawn this frame.
    pub fn mark_used(&mut self, handle: ImageHandle) {
        if let Some(cached) = self.images.get_mut(handle) {
            cached.used = true;
            cached.unused_frames = 0;
        }
    }

    /// Advance the retention window by one frame, unloading images that stayed
    /// unreferenced through a complete frame.
    pub fn sweep(&mut self) {
        self.images.retain(|_, cached| {
            if cached.used {
                cached.used = false;
                cached.unused_frames = 0;
                return true;
            }
            cached.unused_frames += 1;
            cached.unused_frames < 2
        });
    }

    pub fn get(&self, handle: ImageHandle) -> Option<&Image> {
        self.images.get(handle).map(|cached| &cached.image)
    }

    pub fn contains(&self, handle: ImageHandle) -> bool {
        self.images.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;

    #[test]
    fn identical_content_shares_a_handle() {
        let mut cache = ImageCache::new();
        let image = Image::rgba(vec![Color::WHITE; 4], 2, 2);
        let first = cache.load(&image);
        let second = cache.load(&image.clone());
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn retention_survives_one_unreferenced_frame() {
        let mut cache = ImageCache::new();
        let image = Image::rgba(vec![Color::BLACK; 1], 1, 1);
        let handle = cache.load(&image);

        // Referenced frame.
        cache.sweep();
        assert!(cache.contains(handle));

        // One complete frame without references: still loaded, but on notice.
        cache.sweep();
        assert!(cache.contains(handle));

        // Second unreferenced frame: gone.
        cache.sweep();
        assert!(!cache.contains(handle));

        // Re-referencing within the window resets the clock.
        let handle = cache.load(&image);
        cache.sweep();
        cache.mark_used(handle);
        cache.sweep();
        assert!(cache.contains(handle));
    }
}
