//! Builtin operation identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::device::Device;
use crate::error::DispatchError;

/// Implicit operation serviced by a builtin kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuiltinOp {
    CopyBufferToBuffer,
    CopyBufferToBufferStateless,
    CopyBufferRect,
    CopyBufferRectStateless,
    FillBuffer,
    FillBufferStateless,
    CopyBufferToImage3d,
    CopyBufferToImage3dStateless,
    CopyImage3dToBuffer,
    CopyImage3dToBufferStateless,
    CopyImageToImage3d,
    FillImage3d,
    AuxTranslation,
}

impl BuiltinOp {
    pub const ALL: [BuiltinOp; 13] = [
        Self::CopyBufferToBuffer,
        Self::CopyBufferToBufferStateless,
        Self::CopyBufferRect,
        Self::CopyBufferRectStateless,
        Self::FillBuffer,
        Self::FillBufferStateless,
        Self::CopyBufferToImage3d,
        Self::CopyBufferToImage3dStateless,
        Self::CopyImage3dToBuffer,
        Self::CopyImage3dToBufferStateless,
        Self::CopyImageToImage3d,
        Self::FillImage3d,
        Self::AuxTranslation,
    ];

    /// Operation from its numeric id.
    pub fn from_id(id: u32) -> Result<Self, DispatchError> {
        Self::ALL
            .get(id as usize)
            .copied()
            .ok_or_else(|| DispatchError::UnsupportedOperation(format!("id {id}")))
    }

    pub fn id(&self) -> u32 {
        *self as u32
    }

    /// Name of the resource holding this operation's kernels.
    ///
    /// Stateless variants share the stateful resource and differ by
    /// addressing prefix.
    pub const fn resource_name(&self) -> &'static str {
        match self {
            Self::CopyBufferToBuffer | Self::CopyBufferToBufferStateless => "copy_buffer_to_buffer",
            Self::CopyBufferRect | Self::CopyBufferRectStateless => "copy_buffer_rect",
            Self::FillBuffer | Self::FillBufferStateless => "fill_buffer",
            Self::CopyBufferToImage3d | Self::CopyBufferToImage3dStateless => "copy_buffer_to_image3d",
            Self::CopyImage3dToBuffer | Self::CopyImage3dToBufferStateless => "copy_image3d_to_buffer",
            Self::CopyImageToImage3d => "copy_image_to_image3d",
            Self::FillImage3d => "fill_image3d",
            Self::AuxTranslation => "aux_translation",
        }
    }

    /// Variant binding 64-bit offsets.
    pub const fn is_stateless(&self) -> bool {
        matches!(
            self,
            Self::CopyBufferToBufferStateless
                | Self::CopyBufferRectStateless
                | Self::FillBufferStateless
                | Self::CopyBufferToImage3dStateless
                | Self::CopyImage3dToBufferStateless
        )
    }

    /// Stateless counterpart, if the operation has one.
    pub const fn stateless_variant(&self) -> Option<BuiltinOp> {
        match self {
            Self::CopyBufferToBuffer => Some(Self::CopyBufferToBufferStateless),
            Self::CopyBufferRect => Some(Self::CopyBufferRectStateless),
            Self::FillBuffer => Some(Self::FillBufferStateless),
            Self::CopyBufferToImage3d => Some(Self::CopyBufferToImage3dStateless),
            Self::CopyImage3dToBuffer => Some(Self::CopyImage3dToBufferStateless),
            _ => None,
        }
    }

    pub const fn uses_images(&self) -> bool {
        matches!(
            self,
            Self::CopyBufferToImage3d
                | Self::CopyBufferToImage3dStateless
                | Self::CopyImage3dToBuffer
                | Self::CopyImage3dToBufferStateless
                | Self::CopyImageToImage3d
                | Self::FillImage3d
        )
    }

    /// The variant to run on `device`: stateless when it forces 64-bit offsets.
    pub fn for_device(&self, device: &Device) -> BuiltinOp {
        if device.capabilities().force_stateless {
            if let Some(stateless) = self.stateless_variant() {
                return stateless;
            }
        }
        *self
    }
}

impl fmt::Display for BuiltinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_stateless() {
            write!(f, "{}(stateless)", self.resource_name())
        } else {
            f.write_str(self.resource_name())
        }
    }
}

impl FromStr for BuiltinOp {
    type Err = DispatchError;

    /// Parses the resource name, with a `stateless_` prefix for stateless variants.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let (stateless, base) = match name.strip_prefix("stateless_") {
            Some(rest) => (true, rest),
            None => (false, name),
        };
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.is_stateless() == stateless && op.resource_name() == base)
            .ok_or_else(|| DispatchError::UnsupportedOperation(s.to_string()))
    }
}
