//! Services over the safe SQL builder: CRUD, pagination, galleries, validation.

mod crud;
mod form;
mod gallery;
pub mod pagination;
mod validation;

pub use crud::{remove_media, CrudService};
pub use form::{check_json_types, coerce_form};
pub use gallery::{split_form as split_gallery_form, GalleryImage, GalleryService};
pub use pagination::{clamp_page, Page};
pub use validation::{is_email, RequestValidator};
