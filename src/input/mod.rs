pub mod control;
pub mod diagnostics;
pub mod dispatcher;
pub mod event;
pub mod identity;
pub mod manager;
pub mod mapping;
pub mod source;
pub mod target;

#[cfg(test)]
mod control_test;
#[cfg(test)]
mod dispatcher_test;
#[cfg(test)]
mod event_test;
#[cfg(test)]
mod manager_test;
