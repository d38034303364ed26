/// Graphics device module - backend-facing traits and the headless backend

pub mod graphics_device;
pub mod texture;
pub mod buffer;
pub mod pipeline;
pub mod command_list;
pub mod resource_state;
pub mod surface;
pub mod headless;

pub use graphics_device::*;
pub use texture::*;
pub use buffer::*;
pub use pipeline::*;
pub use command_list::*;
pub use resource_state::*;
pub use surface::*;
