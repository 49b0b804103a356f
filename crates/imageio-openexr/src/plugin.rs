//! Plugin entry points.
//!
//! A host discovers the reader either through the Rust-side [`PLUGIN`]
//! descriptor or, when the crate is loaded as a shared object, through the
//! C-linkage symbols:
//!
//! | Symbol | Kind |
//! |---|---|
//! | `openexr_input_imageio_create` | factory returning a new reader |
//! | `openexr_input_imageio_destroy` | releases a reader from the factory |
//! | `openexr_input_extensions` | null-terminated list of file extensions |
//!
//! # Example
//!
//! ```rust
//! use imageio::ImageInput;
//! use imageio_openexr::plugin::PLUGIN;
//!
//! assert_eq!(PLUGIN.format_name, "OpenEXR");
//! assert!((PLUGIN.can_read)(&[0x76, 0x2f, 0x31, 0x01]));
//! let input = (PLUGIN.create)();
//! assert_eq!(input.format_name(), "OpenEXR");
//! ```

use crate::detect;
use crate::input::{FORMAT_NAME, OpenExrInput};
use imageio::ImageInput;
use std::ffi::c_char;

/// File extensions without dots.
pub const EXTENSIONS: &[&str] = &["exr"];

/// Rust-side plugin descriptor.
#[derive(Clone, Copy)]
pub struct PluginInfo {
    /// Stable format identifier.
    pub format_name: &'static str,
    /// File extensions without dots.
    pub extensions: &'static [&'static str],
    /// Checks whether header bytes belong to this format.
    pub can_read: fn(&[u8]) -> bool,
    /// Creates a closed reader.
    pub create: fn() -> Box<dyn ImageInput>,
}

impl std::fmt::Debug for PluginInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInfo")
            .field("format_name", &self.format_name)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

/// Descriptor of the OpenEXR reader.
pub static PLUGIN: PluginInfo = PluginInfo {
    format_name: FORMAT_NAME,
    extensions: EXTENSIONS,
    can_read: detect::can_read,
    create,
};

fn create() -> Box<dyn ImageInput> {
    Box::new(OpenExrInput::new())
}

/// Null-terminated array of C strings.
#[repr(transparent)]
pub struct ExtensionList([*const c_char; 2]);

// The pointers reference static, immutable string literals.
unsafe impl Sync for ExtensionList {}

impl ExtensionList {
    /// Pointer to the first entry.
    pub fn as_ptr(&self) -> *const *const c_char {
        self.0.as_ptr()
    }
}

/// Extensions recognized by the reader, terminated by a null pointer.
#[allow(non_upper_case_globals)]
#[unsafe(no_mangle)]
pub static openexr_input_extensions: ExtensionList =
    ExtensionList([c"exr".as_ptr(), std::ptr::null()]);

/// Creates a new, closed reader. Release it with
/// [`openexr_input_imageio_destroy`].
#[unsafe(no_mangle)]
pub extern "C" fn openexr_input_imageio_create() -> *mut OpenExrInput {
    Box::into_raw(Box::new(OpenExrInput::new()))
}

/// Releases a reader created by [`openexr_input_imageio_create`].
///
/// # Safety
///
/// `input` must be null or a pointer returned by
/// [`openexr_input_imageio_create`] that has not been destroyed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn openexr_input_imageio_destroy(input: *mut OpenExrInput) {
    if !input.is_null() {
        drop(unsafe { Box::from_raw(input) });
    }
}
