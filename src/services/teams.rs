use thiserror::Error;

/// NBA franchise as identified by the stats provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NbaTeam {
    pub id: u32,
    pub abbreviation: &'static str,
    pub full_name: &'static str,
}

const fn team(id: u32, abbreviation: &'static str, full_name: &'static str) -> NbaTeam {
    NbaTeam { id, abbreviation, full_name }
}

pub static NBA_TEAMS: [NbaTeam; 30] = [
    team(1610612737, "ATL", "Atlanta Hawks"),
    team(1610612738, "BOS", "Boston Celtics"),
    team(1610612739, "CLE", "Cleveland Cavaliers"),
    team(1610612740, "NOP", "New Orleans Pelicans"),
    team(1610612741, "CHI", "Chicago Bulls"),
    team(1610612742, "DAL", "Dallas Mavericks"),
    team(1610612743, "DEN", "Denver Nuggets"),
    team(1610612744, "GSW", "Golden State Warriors"),
    team(1610612745, "HOU", "Houston Rockets"),
    team(1610612746, "LAC", "LA Clippers"),
    team(1610612747, "LAL", "Los Angeles Lakers"),
    team(1610612748, "MIA", "Miami Heat"),
    team(1610612749, "MIL", "Milwaukee Bucks"),
    team(1610612750, "MIN", "Minnesota Timberwolves"),
    team(1610612751, "BKN", "Brooklyn Nets"),
    team(1610612752, "NYK", "New York Knicks"),
    team(1610612753, "ORL", "Orlando Magic"),
    team(1610612754, "IND", "Indiana Pacers"),
    team(1610612755, "PHI", "Philadelphia 76ers"),
    team(1610612756, "PHX", "Phoenix Suns"),
    team(1610612757, "POR", "Portland Trail Blazers"),
    team(1610612758, "SAC", "Sacramento Kings"),
    team(1610612759, "SAS", "San Antonio Spurs"),
    team(1610612760, "OKC", "Oklahoma City Thunder"),
    team(1610612761, "TOR", "Toronto Raptors"),
    team(1610612762, "UTA", "Utah Jazz"),
    team(1610612763, "MEM", "Memphis Grizzlies"),
    team(1610612764, "WAS", "Washington Wizards"),
    team(1610612765, "DET", "Detroit Pistons"),
    team(1610612766, "CHA", "Charlotte Hornets"),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TeamLookupError {
    #[error("No team found with abbreviation {query} (did you mean {suggestion}?)")]
    NotFound { query: String, suggestion: &'static str },
}

/// Case-insensitive lookup by three-letter abbreviation, e.g. "phx".
pub fn find_team_by_abbrev(abbrev: &str) -> Result<&'static NbaTeam, TeamLookupError> {
    let wanted = abbrev.trim().to_uppercase();

    if let Some(team) = NBA_TEAMS.iter().find(|t| t.abbreviation == wanted) {
        return Ok(team);
    }

    Err(TeamLookupError::NotFound {
        suggestion: closest_team(&wanted).abbreviation,
        query: wanted,
    })
}

/// Best fuzzy match against both abbreviations and full names.
fn closest_team(query: &str) -> &'static NbaTeam {
    let query = query.to_lowercase();
    let score = |t: &NbaTeam| {
        let abbrev = strsim::jaro_winkler(&query, &t.abbreviation.to_lowercase());
        let name = strsim::jaro_winkler(&query, &t.full_name.to_lowercase());
        abbrev.max(name)
    };

    let mut best = &NBA_TEAMS[0];
    let mut best_score = score(best);
    for t in NBA_TEAMS.iter().skip(1) {
        let s = score(t);
        if s > best_score {
            best = t;
            best_score = s;
        }
    }
    best
}
