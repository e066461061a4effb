//! Year-over-year scans: dream runs, recoveries, persistence, streaks and
//! one-timers.

use serde::Serialize;
use std::fmt;

use crate::analysis::{TrendAnalyzer, MIN_RECOVERY_APPEARANCES};
use crate::error::AnalysisError;
use crate::model::{Rank, SongRow, Year};

/// A song that hit the top band one year and was gone the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DreamRun<'a> {
    pub song: &'a SongRow,
    pub dream_year: Year,
    pub rank_in_dream_year: Rank,
}

/// How a song got back on the up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryType {
    /// Listed in consecutive years with a better rank the second time.
    Climbed,
    /// Listed again after dropping off in an earlier year.
    Returned,
}

impl fmt::Display for RecoveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Climbed => f.pad("climbed"),
            Self::Returned => f.pad("returned"),
        }
    }
}

/// The first year a song improved its rank or came back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recovery<'a> {
    pub song: &'a SongRow,
    pub recovery_type: RecoveryType,
    pub recovery_year: Year,
    /// Rank in the year before `recovery_year`; `None` if not listed then.
    pub previous_rank: Option<Rank>,
    pub new_rank: Rank,
}

/// Fate of the songs from the first playlist year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirstToLast<'a> {
    pub first_year: Year,
    pub last_year: Year,
    /// Listed in the first year and never again.
    pub first_year_only: Vec<&'a SongRow>,
    /// Listed in the first year and at least one later year.
    pub persisted: Vec<&'a SongRow>,
    /// Listed in both the first and the last year. A subset of `persisted`.
    pub persisted_to_last: Vec<&'a SongRow>,
}

/// An unbroken run of years ending at the latest year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Streak<'a> {
    pub song: &'a SongRow,
    pub streak_length: usize,
    pub streak_start_year: Year,
}

/// A song listed in exactly one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OneTimer<'a> {
    pub song: &'a SongRow,
    pub appearance_year: Year,
}

impl<'a> TrendAnalyzer<'a> {
    /// Songs ranked within `[1, threshold]` in some year and absent the
    /// following year. Only the first such year counts for each song.
    ///
    /// Sorted by `dream_year`, latest first.
    pub fn one_year_dream_runs(&self, threshold: u32) -> Result<Vec<DreamRun<'a>>, AnalysisError> {
        self.require_trend_years("one_year_dream_runs")?;
        let years = self.matrix().years();

        let mut runs: Vec<DreamRun<'a>> = self
            .matrix()
            .rows()
            .iter()
            .filter_map(|song| {
                years.windows(2).find_map(|pair| {
                    let rank = song.rank_in(pair[0])?;
                    (rank.is_within(threshold) && !song.is_present(pair[1])).then_some(DreamRun {
                        song,
                        dream_year: pair[0],
                        rank_in_dream_year: rank,
                    })
                })
            })
            .collect();

        runs.sort_by(|a, b| b.dream_year.cmp(&a.dream_year));
        log::info!("Found {} dream run tracks", runs.len());
        Ok(runs)
    }

    /// Songs with at least two appearances that either climbed (better rank
    /// than the year before) or returned after dropping off.
    ///
    /// Dropping off is remembered for the rest of a song's scan, so any later
    /// listing counts as a return. Only the first qualifying year counts.
    /// Sorted by `recovery_year`, latest first.
    pub fn on_the_up(&self) -> Result<Vec<Recovery<'a>>, AnalysisError> {
        self.require_trend_years("on_the_up")?;
        let years = self.matrix().years();

        let mut recoveries: Vec<Recovery<'a>> = self
            .matrix()
            .rows()
            .iter()
            .filter(|song| song.list_appearances() >= MIN_RECOVERY_APPEARANCES)
            .filter_map(|song| first_recovery(song, years))
            .collect();

        recoveries.sort_by(|a, b| b.recovery_year.cmp(&a.recovery_year));
        log::info!("Found {} tracks on the up", recoveries.len());
        Ok(recoveries)
    }

    /// Split the songs of the first year by whether they were listed again.
    pub fn first_to_last_time(&self) -> Result<FirstToLast<'a>, AnalysisError> {
        self.require_trend_years("first_to_last_time")?;
        let years = self.matrix().years();
        let (first_year, last_year) = (years[0], years[years.len() - 1]);

        let mut first_year_only = Vec::new();
        let mut persisted = Vec::new();
        let mut persisted_to_last = Vec::new();

        for song in self.matrix().rows().iter().filter(|s| s.is_present(first_year)) {
            if song.present_years().any(|year| year > first_year) {
                persisted.push(song);
            } else {
                first_year_only.push(song);
            }
            if song.is_present(last_year) {
                persisted_to_last.push(song);
            }
        }

        log::info!(
            "First to last: {} disappeared, {} persisted, {} still in latest",
            first_year_only.len(),
            persisted.len(),
            persisted_to_last.len()
        );

        Ok(FirstToLast {
            first_year,
            last_year,
            first_year_only,
            persisted,
            persisted_to_last,
        })
    }

    /// Songs listed in each of the last `min_consecutive` or more years,
    /// up to and including the latest.
    ///
    /// Sorted by `streak_length`, longest first.
    pub fn active_streaks(&self, min_consecutive: usize) -> Result<Vec<Streak<'a>>, AnalysisError> {
        self.require_trend_years("active_streaks")?;
        let years = self.matrix().years();

        let mut streaks: Vec<Streak<'a>> = self
            .matrix()
            .rows()
            .iter()
            .filter_map(|song| {
                let streak_length = years
                    .iter()
                    .rev()
                    .take_while(|&&year| song.is_present(year))
                    .count();
                (streak_length > 0 && streak_length >= min_consecutive).then(|| Streak {
                    song,
                    streak_length,
                    streak_start_year: years[years.len() - streak_length],
                })
            })
            .collect();

        streaks.sort_by(|a, b| b.streak_length.cmp(&a.streak_length));
        log::info!("Found {} active streaks", streaks.len());
        Ok(streaks)
    }

    /// Songs listed in exactly one year. Sorted by that year, latest first.
    pub fn one_timers(&self) -> Vec<OneTimer<'a>> {
        let mut one_timers: Vec<OneTimer<'a>> = self
            .matrix()
            .rows()
            .iter()
            .filter(|song| song.list_appearances() == 1)
            .filter_map(|song| {
                song.present_years().next().map(|appearance_year| OneTimer {
                    song,
                    appearance_year,
                })
            })
            .collect();

        one_timers.sort_by(|a, b| b.appearance_year.cmp(&a.appearance_year));
        log::info!("Found {} one-time appearances", one_timers.len());
        one_timers
    }
}

fn first_recovery<'a>(song: &'a SongRow, years: &[Year]) -> Option<Recovery<'a>> {
    let mut off_list = false;
    for pair in years.windows(2) {
        let current = song.rank_in(pair[0]);
        let next = song.rank_in(pair[1]);

        if current.is_some() && next.is_none() {
            off_list = true;
        }

        let Some(new_rank) = next else { continue };
        let climbed = current.is_some_and(|previous| new_rank.beats(previous));
        if climbed || off_list {
            return Some(Recovery {
                song,
                recovery_type: if off_list {
                    RecoveryType::Returned
                } else {
                    RecoveryType::Climbed
                },
                recovery_year: pair[1],
                previous_rank: current,
                new_rank,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use crate::analysis::fixtures::{self, named};
    use crate::analysis::{
        RecoveryType, TrendAnalyzer, DEFAULT_DREAM_RUN_THRESHOLD, DEFAULT_MIN_CONSECUTIVE,
    };
    use crate::model::Rank;

    #[test]
    fn test_dream_run_scenario() {
        let matrix = fixtures::scenario();
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        let runs = analyzer.one_year_dream_runs(DEFAULT_DREAM_RUN_THRESHOLD).unwrap();

        let song_a = runs.iter().find(|r| r.song.name == "Song A").unwrap();
        assert_eq!(song_a.dream_year, 2018);
        assert_eq!(song_a.rank_in_dream_year, Rank::new(3).unwrap());

        // C never drops off; B was never top 10; D's last year is 2019 at #7
        // and it is absent in 2020.
        assert!(!runs.iter().any(|r| r.song.name == "Song C"));
        assert!(!runs.iter().any(|r| r.song.name == "Song B"));
        let song_d = runs.iter().find(|r| r.song.name == "Song D").unwrap();
        assert_eq!(song_d.dream_year, 2019);
    }

    #[test]
    fn test_dream_runs_sorted_latest_first() {
        let matrix = fixtures::scenario();
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        let runs = analyzer.one_year_dream_runs(DEFAULT_DREAM_RUN_THRESHOLD).unwrap();
        let years: Vec<i32> = runs.iter().map(|r| r.dream_year).collect();
        assert_eq!(years, vec![2019, 2018]);
    }

    #[test]
    fn test_dream_run_first_transition_wins() {
        let matrix = fixtures::matrix(&[
            ("Twice", &["Band"], &[(2018, 1), (2020, 2)]),
            ("Filler", &["Other"], &[(2019, 50), (2021, 50)]),
        ]);
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        let runs = analyzer.one_year_dream_runs(10).unwrap();
        let twice: Vec<_> = runs.iter().filter(|r| r.song.name == "Twice").collect();
        assert_eq!(twice.len(), 1);
        assert_eq!(twice[0].dream_year, 2018);
    }

    #[test]
    fn test_dream_run_threshold_bounds() {
        let matrix = fixtures::matrix(&[
            ("Edge", &["Band"], &[(2018, 10)]),
            ("Outside", &["Band"], &[(2018, 11)]),
            ("Later", &["Other"], &[(2019, 1), (2020, 1)]),
        ]);
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        let runs = analyzer.one_year_dream_runs(10).unwrap();
        assert_eq!(named(runs.iter().map(|r| r.song)), vec!["Edge"]);

        let wider = analyzer.one_year_dream_runs(11).unwrap();
        assert_eq!(wider.len(), 2);
    }

    #[test]
    fn test_dream_run_not_flagged_in_final_year() {
        let matrix = fixtures::matrix(&[
            ("Old", &["Band"], &[(2018, 30)]),
            ("Fresh", &["Band"], &[(2019, 1)]),
        ]);
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        assert!(analyzer.one_year_dream_runs(10).unwrap().is_empty());
    }

    #[test]
    fn test_on_the_up_returned_scenario() {
        let matrix = fixtures::scenario();
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        let recoveries = analyzer.on_the_up().unwrap();

        assert_eq!(named(recoveries.iter().map(|r| r.song)), vec!["Song B"]);
        let song_b = &recoveries[0];
        assert_eq!(song_b.recovery_type, RecoveryType::Returned);
        assert_eq!(song_b.recovery_year, 2020);
        assert_eq!(song_b.previous_rank, None);
        assert_eq!(song_b.new_rank, Rank::new(20).unwrap());
    }

    #[test]
    fn test_on_the_up_climbed() {
        let matrix = fixtures::matrix(&[("Riser", &["Band"], &[(2018, 40), (2019, 12), (2020, 3)])]);
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        let recoveries = analyzer.on_the_up().unwrap();

        assert_eq!(recoveries.len(), 1);
        assert_eq!(recoveries[0].recovery_type, RecoveryType::Climbed);
        assert_eq!(recoveries[0].recovery_year, 2019);
        assert_eq!(recoveries[0].previous_rank, Rank::new(40));
        assert_eq!(recoveries[0].new_rank, Rank::new(12).unwrap());
    }

    #[test]
    fn test_on_the_up_ignores_falling_and_late_debuts() {
        let matrix = fixtures::matrix(&[
            ("Faller", &["Band"], &[(2018, 3), (2019, 12), (2020, 40)]),
            ("Debut", &["Band"], &[(2019, 50), (2020, 60)]),
            ("Steady", &["Band"], &[(2018, 8), (2019, 8), (2020, 8)]),
        ]);
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        assert!(analyzer.on_the_up().unwrap().is_empty());
    }

    #[test]
    fn test_on_the_up_off_list_is_sticky() {
        // Drops off after 2018, returns in 2020 at a worse rank than 2018.
        let matrix = fixtures::matrix(&[
            ("Comeback", &["Band"], &[(2018, 2), (2020, 90)]),
            ("Filler", &["Other"], &[(2019, 1)]),
        ]);
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        let recoveries = analyzer.on_the_up().unwrap();
        assert_eq!(recoveries.len(), 1);
        assert_eq!(recoveries[0].song.name, "Comeback");
        assert_eq!(recoveries[0].recovery_type, RecoveryType::Returned);
    }

    #[test]
    fn test_on_the_up_sorted_latest_first() {
        let matrix = fixtures::matrix(&[
            ("Early", &["Band"], &[(2018, 9), (2019, 4)]),
            ("Late", &["Band"], &[(2019, 9), (2020, 4)]),
        ]);
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        let recoveries = analyzer.on_the_up().unwrap();
        assert_eq!(named(recoveries.iter().map(|r| r.song)), vec!["Late", "Early"]);
    }

    #[test]
    fn test_first_to_last_scenario() {
        let matrix = fixtures::scenario();
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        let comparison = analyzer.first_to_last_time().unwrap();

        assert_eq!(comparison.first_year, 2018);
        assert_eq!(comparison.last_year, 2020);
        assert_eq!(named(comparison.first_year_only.iter().copied()), vec!["Song A"]);

        let mut persisted = named(comparison.persisted.iter().copied());
        persisted.sort_unstable();
        assert_eq!(persisted, vec!["Song B", "Song C"]);

        let mut to_last = named(comparison.persisted_to_last.iter().copied());
        to_last.sort_unstable();
        assert_eq!(to_last, vec!["Song B", "Song C"]);
    }

    #[test]
    fn test_first_to_last_persisted_but_not_to_last() {
        let matrix = fixtures::matrix(&[
            ("Faded", &["Band"], &[(2018, 1), (2019, 1)]),
            ("Filler", &["Other"], &[(2020, 1)]),
        ]);
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        let comparison = analyzer.first_to_last_time().unwrap();
        assert_eq!(named(comparison.persisted.iter().copied()), vec!["Faded"]);
        assert!(comparison.persisted_to_last.is_empty());
        assert!(comparison.first_year_only.is_empty());
    }

    #[test]
    fn test_active_streak_scenario() {
        let matrix = fixtures::scenario();
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        let streaks = analyzer.active_streaks(DEFAULT_MIN_CONSECUTIVE).unwrap();

        assert_eq!(named(streaks.iter().map(|s| s.song)), vec!["Song C"]);
        assert_eq!(streaks[0].streak_length, 3);
        assert_eq!(streaks[0].streak_start_year, 2018);
    }

    #[test]
    fn test_active_streak_broken_by_gap() {
        let matrix = fixtures::matrix(&[
            ("Gap", &["Band"], &[(2017, 1), (2019, 1), (2020, 1)]),
            ("Filler", &["Other"], &[(2018, 1)]),
        ]);
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();

        assert!(analyzer.active_streaks(3).unwrap().is_empty());
        let streaks = analyzer.active_streaks(2).unwrap();
        assert_eq!(streaks.len(), 1);
        assert_eq!(streaks[0].streak_length, 2);
        assert_eq!(streaks[0].streak_start_year, 2019);
    }

    #[test]
    fn test_active_streak_requires_latest_year() {
        let matrix = fixtures::matrix(&[
            ("Retired", &["Band"], &[(2018, 1), (2019, 1), (2020, 1)]),
            ("Filler", &["Other"], &[(2021, 1)]),
        ]);
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        assert!(analyzer.active_streaks(1).unwrap().iter().all(|s| s.song.name != "Retired"));
    }

    #[test]
    fn test_active_streaks_sorted_longest_first() {
        let matrix = fixtures::matrix(&[
            ("Short", &["Band"], &[(2019, 1), (2020, 1)]),
            ("Long", &["Band"], &[(2018, 2), (2019, 2), (2020, 2)]),
        ]);
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        let streaks = analyzer.active_streaks(1).unwrap();
        assert_eq!(named(streaks.iter().map(|s| s.song)), vec!["Long", "Short"]);
    }

    #[test]
    fn test_one_timers_scenario() {
        let matrix = fixtures::scenario();
        let analyzer = TrendAnalyzer::new(&matrix).unwrap();
        let one_timers = analyzer.one_timers();

        assert_eq!(named(one_timers.iter().map(|o| o.song)), vec!["Song D", "Song A"]);
        let song_d = &one_timers[0];
        assert_eq!(song_d.appearance_year, 2019);
        assert_eq!(song_d.song.list_appearances(), 1);
        assert_eq!(song_d.song.score(), 94);
        assert!(!one_timers.iter().any(|o| o.song.name == "Song C"));
    }
}
