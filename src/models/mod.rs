// Domain models: devices and traffic channel messages

mod device;
mod traffic;

pub use device::Device;
pub(crate) use device::deserialize_optional_id;
pub use traffic::{INTERFACES_LIST, InterfaceRates, TRAFFIC_UPDATE, TrafficMessage};
