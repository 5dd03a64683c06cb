pub mod list;
pub mod picker;

pub use list::{EditBuffer, ListPhase, ListRequest, ResourceListController};
pub use picker::{UserFilterField, UserFilters, UserPickerController, UserSelection};
