//! Command registration, resolution and dispatch.
//!
//! Definitions are registered into a [`Catalog`] at startup. For each inbound
//! message the [`Dispatcher`] picks the most specific matching command, checks
//! it against the loaded permission policies, coerces its arguments and runs
//! the registered handler.

pub mod catalog;
pub mod coerce;
pub mod definitions;
pub mod handlers;
pub mod help;
pub mod matcher;
pub mod output;
pub mod router;

pub use catalog::{Catalog, CatalogBuilder, CatalogEntry, RegistrationError};
pub use coerce::{ArgValue, Arguments, CoercionError};
pub use definitions::{CommandDef, ContainerKind, EnumType, ParamSpec, ParamType, Parseable};
pub use handlers::{handler_fn, register_builtins, CommandHandler, InvocationContext};
pub use output::CommandOutput;
pub use router::{BufferResponder, DispatchOutcome, Dispatcher, Responder};
