/// UI module
///
/// Views for the two screens: the month list and the swipe deck.
/// Both are plain functions of application state.

pub mod home;
pub mod swipe;
