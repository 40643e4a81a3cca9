//! Navigation port

use crate::domain::View;

/// Sends the front end to a view after auth state changes
pub trait Navigator: Send + Sync {
    fn navigate(&self, view: View);
}
