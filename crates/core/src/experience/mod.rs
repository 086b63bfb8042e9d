//! Experience descriptors: the primary media plus its scheduled overlays.

mod offset;
mod types;
mod wire;

pub use offset::{parse_clock_offset, OffsetParseError};
pub use types::{ExperienceDescriptor, OverlayDescriptor, Position};
pub use wire::{parse_experience, DescriptorError};
