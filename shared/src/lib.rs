pub mod county;
pub mod interaction;
pub mod map_view;
pub mod path;
pub mod performance;
pub mod projection;
pub mod ranking;
pub mod svg;
pub mod tier;

pub use county::*;
pub use interaction::*;
pub use map_view::*;
pub use performance::*;
pub use projection::{DEFAULT_VIEW_BOX, ViewBox};
pub use ranking::*;
pub use svg::MapRender;
pub use tier::*;
