//! Generic identity attribute interface.

use std::any::Any;
use std::fmt;

/// Identity attributes attached to a call, queryable by name.
///
/// Authorization code consumes this trait without knowing how the identity
/// was established. Implementations must be pure: the same name always
/// yields the same value, and unknown names yield `None` instead of an error.
///
/// `Any` is a supertrait so callers that do know the concrete type can
/// downcast, see [`ClientInfo::auth_as`](crate::ClientInfo::auth_as).
pub trait AuthData: Any + Send + Sync + fmt::Debug {
    /// Returns the value of the attribute `name`, or `None` if it is not supported.
    fn get_attribute(&self, name: &str) -> Option<&str>;

    /// Returns every attribute name this identity supports, in a stable order.
    fn attribute_names(&self) -> &[&str];
}
