//! Typed view over the analysis payload
//!
//! The session layer treats the report as an opaque JSON document and
//! caches it exactly as received. Presentation deserializes this lenient
//! view from it: every field defaults, so a payload from an older or newer
//! backend still renders.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The analysis payload as the session layer carries it: opaque JSON
pub type Report = Value;

/// Top-level analysis report
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub user_profile: UserProfile,
    #[serde(default)]
    pub listening_history: ListeningHistory,
    #[serde(default)]
    pub genre_diversity: GenreDiversity,
    #[serde(default)]
    pub obscurity_score: ObscurityScore,
    #[serde(default)]
    pub uniqueness_score: UniquenessScore,
    #[serde(default)]
    pub top_artists: TopByTerm<Artist>,
    #[serde(default)]
    pub top_tracks: TopByTerm<Track>,
    #[serde(default)]
    pub insights: Vec<String>,
}

impl AnalysisReport {
    /// Deserialize the typed view from an opaque report
    ///
    /// Unknown or missing sections fall back to defaults; a payload that is
    /// not even an object yields an empty report.
    pub fn from_report(report: &Report) -> Self {
        serde_json::from_value(report.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub followers: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ListeningHistory {
    #[serde(default)]
    pub total_tracks_played: u64,
    #[serde(default)]
    pub unique_tracks: u64,
    #[serde(default)]
    pub unique_artists: u64,
    #[serde(default)]
    pub repetition_rate: f64,
    /// Play counts keyed by hour of day ("0".."23")
    #[serde(default)]
    pub listening_by_hour: BTreeMap<String, u64>,
    /// Play counts keyed by day of week
    #[serde(default)]
    pub listening_by_day: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GenreDiversity {
    /// Normalized Shannon-entropy diversity, 0..1
    #[serde(default)]
    pub diversity_score: f64,
    #[serde(default)]
    pub unique_genres: u64,
    #[serde(default)]
    pub genre_distribution: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ObscurityScore {
    /// 0..1; inverse of average popularity
    #[serde(default)]
    pub obscurity_score: f64,
    #[serde(default)]
    pub avg_artist_popularity: f64,
    #[serde(default)]
    pub avg_track_popularity: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UniquenessScore {
    /// 0..1 combined score
    #[serde(default)]
    pub uniqueness_score: f64,
    /// Human-readable rating, e.g. "Extremely Unique"
    #[serde(default)]
    pub rating: String,
}

/// Top artists or tracks grouped by listening term
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopByTerm<T> {
    #[serde(default = "Vec::new")]
    pub short_term: Vec<T>,
    #[serde(default = "Vec::new")]
    pub medium_term: Vec<T>,
    #[serde(default = "Vec::new")]
    pub long_term: Vec<T>,
}

impl<T> Default for TopByTerm<T> {
    fn default() -> Self {
        Self {
            short_term: Vec::new(),
            medium_term: Vec::new(),
            long_term: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Artist {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Track {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<TrackArtist>,
    #[serde(default)]
    pub album: Album,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub explicit: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrackArtist {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Album {
    #[serde(default)]
    pub name: String,
}

impl Track {
    /// Format the track duration as m:ss
    pub fn duration_display(&self) -> String {
        let minutes = self.duration_ms / 60_000;
        let seconds = (self.duration_ms % 60_000) / 1000;
        format!("{}:{:02}", minutes, seconds)
    }

    /// Name of the primary artist
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(|a| a.name.as_str()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_typed_view_of_backend_payload() {
        let payload = json!({
            "user_profile": {"id": "u1", "name": "Sam", "followers": 12},
            "listening_history": {
                "total_tracks_played": 412,
                "unique_tracks": 301,
                "unique_artists": 120,
                "repetition_rate": 0.27,
                "listening_by_hour": {"9": 14, "22": 40}
            },
            "genre_diversity": {
                "diversity_score": 0.81,
                "unique_genres": 34,
                "genre_distribution": {"indie rock": 18, "shoegaze": 9}
            },
            "obscurity_score": {"obscurity_score": 0.62},
            "uniqueness_score": {"uniqueness_score": 0.74, "rating": "Very Unique"},
            "top_artists": {"short_term": [{"id": "a1", "name": "Duster", "genres": ["slowcore"], "popularity": 55}]},
            "top_tracks": {"short_term": [{
                "id": "t1", "name": "Inside Out",
                "artists": [{"name": "Duster"}],
                "album": {"name": "Stratosphere"},
                "duration_ms": 193000, "popularity": 48, "explicit": false
            }]},
            "insights": ["You prefer lesser-known tracks"]
        });

        let report = AnalysisReport::from_report(&payload);
        assert_eq!(report.user_profile.name, "Sam");
        assert_eq!(report.listening_history.total_tracks_played, 412);
        assert_eq!(report.genre_diversity.unique_genres, 34);
        assert_eq!(report.uniqueness_score.rating, "Very Unique");
        assert_eq!(report.top_artists.short_term[0].name, "Duster");
        assert_eq!(report.top_tracks.short_term[0].duration_display(), "3:13");
        assert_eq!(report.top_tracks.short_term[0].primary_artist(), "Duster");
        assert_eq!(report.insights.len(), 1);
        // Sections the backend omitted default cleanly.
        assert!(report.top_artists.long_term.is_empty());
    }

    #[test]
    fn test_malformed_payload_yields_empty_view() {
        let report = AnalysisReport::from_report(&json!("not an object"));
        assert_eq!(report.user_profile.name, "");
        assert!(report.insights.is_empty());
    }
}
