pub mod process_invoker;

pub use process_invoker::{CommandInvoker, InvocationOutcome, Invoker, EXECUTABLE_NOT_FOUND};
