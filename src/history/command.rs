use crate::foundation::error::VeneerResult;

/// A reversible edit against a context `C`.
///
/// `execute` and `undo` are each called alternately by the manager; implementations store
/// absolute before/after values so replaying either direction lands on the same state.
pub trait Command<C: ?Sized> {
    fn execute(&mut self, ctx: &mut C) -> VeneerResult<()>;

    fn undo(&mut self, ctx: &mut C) -> VeneerResult<()>;

    fn description(&self) -> String;
}
