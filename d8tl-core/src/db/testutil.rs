//! Fixture builders shared by the database tests.

use chrono::NaiveDate;
use uuid::Uuid;

use super::Database;
use crate::models::*;

pub(crate) fn test_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    db
}

pub(crate) fn program(db: &Database) -> Program {
    db.create_program(CreateProgramInput {
        name: "Baseball 12U".into(),
        code: format!("BB12U-{}", &Uuid::new_v4().to_string()[..8]),
        sport: "Baseball".into(),
        min_age: 8,
        max_age: 12,
    })
    .unwrap()
}

pub(crate) fn season(db: &Database, program_id: Uuid) -> Season {
    db.create_season(CreateSeasonInput {
        program_id,
        name: "Spring 2025".into(),
        start_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
    })
    .unwrap()
}

pub(crate) fn division(db: &Database, season_id: Uuid) -> Division {
    db.create_division(CreateDivisionInput {
        season_id,
        name: "East".into(),
    })
    .unwrap()
}

pub(crate) fn team(
    db: &Database,
    division_id: Uuid,
    name: &str,
    manager_email: Option<&str>,
) -> Team {
    db.create_team(CreateTeamInput {
        division_id,
        name: name.into(),
        manager_name: format!("{name} Manager"),
        manager_email: manager_email.map(String::from),
        manager_phone: None,
    })
    .unwrap()
}

pub(crate) fn location(db: &Database, name: &str) -> Location {
    db.create_location(CreateLocationInput {
        name: name.into(),
        address: "1 Park Dr".into(),
        latitude: None,
        longitude: None,
        notes: None,
    })
    .unwrap()
}

pub(crate) fn game(
    db: &Database,
    division_id: Uuid,
    home_team_id: Uuid,
    away_team_id: Uuid,
    location_id: Uuid,
) -> Game {
    db.create_game(CreateGameInput {
        division_id,
        home_team_id,
        away_team_id,
        location_id,
        game_date: NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
        game_time: "17:30".into(),
    })
    .unwrap()
}

/// Full fixture: program → season → division → two teams → game.
pub(crate) struct LeagueFixture {
    pub program: Program,
    pub season: Season,
    pub division: Division,
    pub home: Team,
    pub away: Team,
    pub location: Location,
    pub game: Game,
}

pub(crate) fn league(db: &Database) -> LeagueFixture {
    let program = program(db);
    let season = season(db, program.id);
    let division = division(db, season.id);
    let home = team(db, division.id, "Rockets", Some("rockets@d8tl.org"));
    let away = team(db, division.id, "Comets", Some("comets@d8tl.org"));
    let location = location(db, "Veterans Park");
    let game = game(db, division.id, home.id, away.id, location.id);
    LeagueFixture {
        program,
        season,
        division,
        home,
        away,
        location,
        game,
    }
}
