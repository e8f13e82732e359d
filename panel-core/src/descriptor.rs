//! Simulator-side bindings.
//!
//! A [`Descriptor`] is a closed set of three kinds:
//!
//! - **data**: a client data area the simulator pushes as a binary block
//! - **write**: an event id values are transmitted to
//! - **read**: one named field out of a sibling data block's decode
//!
//! The numeric `handle` is what the transport uses to tag inbound events;
//! the string `id` is what everything else refers to.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use panel_proto::Layout;

use crate::error::CallbackError;
use crate::value::Value;

/// Callback installed on a registered descriptor.
pub type SimCallback = Rc<dyn Fn(&Descriptor, &Value) -> Result<(), CallbackError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDescriptor {
    /// Block size in bytes.
    pub size: usize,
    pub data_name: String,
    pub data_id: u32,
    pub definition_id: u32,
    /// Key of a data parser in the callback registry.
    pub parser: Option<String>,
    /// `None` is treated as `Some(true)`.
    pub update_on_change: Option<bool>,
    pub layout: Option<Layout>,
}

impl DataDescriptor {
    pub fn new(data_name: impl Into<String>, data_id: u32, definition_id: u32, size: usize) -> Self {
        Self {
            size,
            data_name: data_name.into(),
            data_id,
            definition_id,
            parser: None,
            update_on_change: None,
            layout: None,
        }
    }

    #[must_use]
    pub fn parser(mut self, key: impl Into<String>) -> Self {
        self.parser = Some(key.into());
        self
    }

    /// Attach a layout. The block size follows the layout.
    #[must_use]
    pub fn layout(mut self, layout: Layout) -> Self {
        self.size = layout.size();
        self.layout = Some(layout);
        self
    }

    #[must_use]
    pub fn update_on_change(mut self, on_change: bool) -> Self {
        self.update_on_change = Some(on_change);
        self
    }

    /// Whether the simulator should only send the block when it changes.
    pub fn on_change(&self) -> bool {
        self.update_on_change.unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteDescriptor {
    /// Simulator event the value is sent to.
    pub event: u32,
    /// Named positions of a discrete switch.
    pub values: Vec<(String, i32)>,
}

impl WriteDescriptor {
    pub fn new(event: u32) -> Self {
        Self {
            event,
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn value(mut self, name: impl Into<String>, value: i32) -> Self {
        self.values.push((name.into(), value));
        self
    }

    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadDescriptor {
    /// Field name in the sibling data block.
    pub name: String,
    /// Element index when the field is an array.
    pub position: Option<usize>,
}

impl ReadDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
        }
    }

    #[must_use]
    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorKind {
    Data(DataDescriptor),
    Write(WriteDescriptor),
    Read(ReadDescriptor),
}

impl From<DataDescriptor> for DescriptorKind {
    fn from(d: DataDescriptor) -> Self {
        DescriptorKind::Data(d)
    }
}

impl From<WriteDescriptor> for DescriptorKind {
    fn from(d: WriteDescriptor) -> Self {
        DescriptorKind::Write(d)
    }
}

impl From<ReadDescriptor> for DescriptorKind {
    fn from(d: ReadDescriptor) -> Self {
        DescriptorKind::Read(d)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DescriptorTag {
    Data,
    Write,
    Read,
}

impl fmt::Display for DescriptorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Data => "data",
            Self::Write => "write",
            Self::Read => "read",
        })
    }
}

/// One simulator-side binding.
#[derive(Clone)]
pub struct Descriptor {
    pub id: String,
    pub handle: u32,
    pub kind: DescriptorKind,
    pub callback: Option<SimCallback>,
}

impl Descriptor {
    pub fn new(id: impl Into<String>, handle: u32, kind: impl Into<DescriptorKind>) -> Self {
        Self {
            id: id.into(),
            handle,
            kind: kind.into(),
            callback: None,
        }
    }

    #[must_use]
    pub fn with_callback(
        mut self,
        callback: impl Fn(&Descriptor, &Value) -> Result<(), CallbackError> + 'static,
    ) -> Self {
        self.callback = Some(Rc::new(callback));
        self
    }

    pub fn tag(&self) -> DescriptorTag {
        match self.kind {
            DescriptorKind::Data(_) => DescriptorTag::Data,
            DescriptorKind::Write(_) => DescriptorTag::Write,
            DescriptorKind::Read(_) => DescriptorTag::Read,
        }
    }

    pub fn as_data(&self) -> Option<&DataDescriptor> {
        match &self.kind {
            DescriptorKind::Data(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_write(&self) -> Option<&WriteDescriptor> {
        match &self.kind {
            DescriptorKind::Write(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_read(&self) -> Option<&ReadDescriptor> {
        match &self.kind {
            DescriptorKind::Read(d) => Some(d),
            _ => None,
        }
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("kind", &self.kind)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
