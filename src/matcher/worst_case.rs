use super::MatchFinder;
use crate::yaz0::Match;

/// Never finds anything: every token becomes a literal.
///
/// Output size is exactly `16 + n + ceil(n / 8)`, the figure the size
/// estimator is built around.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorstCaseFinder;

impl MatchFinder for WorstCaseFinder {
    fn find_match(&mut self, _src: &[u8], _pos: usize) -> Option<Match> {
        None
    }
}
