mod division;
mod email;
mod game;
mod location;
mod portal_session;
mod program;
mod schedule;
mod season;
mod team;

pub use division::*;
pub use email::*;
pub use game::*;
pub use location::*;
pub use portal_session::*;
pub use program::*;
pub use schedule::*;
pub use season::*;
pub use team::*;
