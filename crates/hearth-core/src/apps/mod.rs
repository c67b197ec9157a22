//! Interactive applications and the registry that switches between them

pub mod application;
pub mod registry;
pub mod theme_selector;

pub use application::{Action, AppActions, AppContext, AppId, AppWrapper, Application};
pub use registry::AppRegistry;
pub use theme_selector::ThemeSelectorApp;
