//! Page-level session handling.
//!
//! Each page mount owns one `SessionController`, which reads the token
//! store through an explicitly passed `SessionContext`, drives the page's
//! `PageState`, and schedules redirects that die with the page.

pub mod context;
pub mod controller;
pub mod navigation;
pub mod pages;
pub mod state;

pub use context::SessionContext;
pub use controller::SessionController;
pub use navigation::{ChannelNavigator, NavigationEvent, Navigator, Route, ScheduledRedirect};
pub use pages::{CallbackPage, HomePage, LoginPage, ServicePage, SignupPage};
pub use state::{PageState, PageStatus};
