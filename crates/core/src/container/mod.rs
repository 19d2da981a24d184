pub mod callable;
#[allow(clippy::module_inception)]
pub mod container;
pub mod inference;
pub mod key;
pub mod resolver;
pub mod value;

pub use callable::{Args, Constructor, Function};
pub use container::Container;
pub use inference::{infer_parameter_names, parse_signature, Signature, SignatureForm};
pub use key::Key;
pub use resolver::Resolver;
pub use value::{Data, Deferred, Value};
