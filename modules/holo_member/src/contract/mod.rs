pub mod model;

pub use model::{GenerationType, HoloMember, HoloMemberPatch, NewHoloMember};
