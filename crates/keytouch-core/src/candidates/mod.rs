// Keytouch Candidates
// Paging bookkeeping and the displayed candidate window

mod pager;
mod window;

pub use pager::CandidatePager;
pub use window::{CandidateList, CandidateWindow};
