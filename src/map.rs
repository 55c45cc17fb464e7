use crate::engine::Location;
use crate::entities::{check_player, Entity};
use regex::Regex;

/// Reasons a map text could not be loaded.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MapError {
    #[error("map is missing the `rows` and `cols` headers")]
    MissingDimensions,
    #[error("map is missing the `players` header")]
    MissingPlayers,
    #[error("map has more than {height} rows")]
    TooManyRows { height: usize },
    #[error("map row {row} is wider than {width} columns")]
    RowTooWide { row: usize, width: usize },
    #[error("invalid character '{value}' at ({row}, {col})")]
    InvalidCharacter { value: char, row: usize, col: usize },
    #[error("player {player} at ({row}, {col}) exceeds the {players} players of the map")]
    PlayerOutOfRange {
        player: usize,
        players: usize,
        row: usize,
        col: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Map {
    width: usize,
    height: usize,
    players: usize,
    grid: Vec<Option<Entity>>,
}

impl Map {
    pub fn parse(map_contents: &str) -> Result<Map, MapError> {
        let metadata = Regex::new(r"rows (\d+)\s+cols (\d+)")
            .unwrap()
            .captures(map_contents)
            .ok_or(MapError::MissingDimensions)?;

        let height = metadata[1]
            .parse()
            .map_err(|_| MapError::MissingDimensions)?;
        let width = metadata[2]
            .parse()
            .map_err(|_| MapError::MissingDimensions)?;

        let players = Regex::new(r"players (\d+)")
            .unwrap()
            .captures(map_contents)
            .and_then(|captures| captures[1].parse().ok())
            .ok_or(MapError::MissingPlayers)?;

        let mut map = Map::new(width, height, players);

        let lines = Regex::new(r"m (.*)").unwrap();
        for (row, captures) in lines.captures_iter(map_contents).enumerate() {
            if row >= height {
                return Err(MapError::TooManyRows { height });
            }

            for (col, value) in captures[1].trim().chars().enumerate() {
                if col >= width {
                    return Err(MapError::RowTooWide { row, width });
                }

                let entity = Entity::from_char(value)
                    .map_err(|value| MapError::InvalidCharacter { value, row, col })?;
                if let Some(entity) = entity {
                    check_player(&entity, players, row, col)?;
                    map.set(row, col, entity);
                }
            }
        }

        Ok(map)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Entity> {
        self.grid
            .get(row * self.width + col)
            .and_then(|cell| cell.as_ref())
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Entity> {
        self.grid
            .get_mut(row * self.width + col)
            .and_then(|cell| cell.as_mut())
    }

    pub fn set(&mut self, row: usize, col: usize, value: Entity) {
        self.grid[row * self.width + col] = Some(value);
    }

    pub fn remove(&mut self, row: usize, col: usize) {
        self.grid[row * self.width + col] = None;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn players(&self) -> usize {
        self.players
    }

    pub fn contains(&self, (row, col): Location) -> bool {
        row < self.height && col < self.width
    }

    /// All ants on the map, dead or alive, in row-major order.
    pub fn ants(&self) -> Vec<(&Entity, Location)> {
        self.all(|entity| matches!(entity, Entity::Ant { .. }))
    }

    /// Locations of the live ants of `player` in row-major order.
    pub fn ants_of(&self, player: usize) -> Vec<Location> {
        self.ants()
            .into_iter()
            .filter(|(ant, _)| ant.is_live_ant() && ant.player() == Some(player))
            .map(|(_, location)| location)
            .collect()
    }

    /// Hills as `(owner, location)`, including those with an ant standing on them.
    pub fn ant_hills(&self) -> Vec<(usize, Location)> {
        self.grid
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| {
                let owner = match cell {
                    Some(Entity::Hill { player }) => *player,
                    Some(Entity::Ant {
                        on_hill: Some(owner),
                        ..
                    }) => *owner,
                    _ => return None,
                };
                Some((owner, (index / self.width, index % self.width)))
            })
            .collect()
    }

    /// Row-major mask of the cells within `radius2` (squared euclidean distance)
    /// of at least one of the given centers.
    pub fn visibility(&self, centers: &[Location], radius2: usize) -> Vec<bool> {
        let mut visible = vec![false; self.width * self.height];
        if self.width == 0 || self.height == 0 {
            return visible;
        }

        let radius = (radius2 as f64).sqrt() as usize;
        for &(row, col) in centers {
            for i in row.saturating_sub(radius)..=(row + radius).min(self.height - 1) {
                for j in col.saturating_sub(radius)..=(col + radius).min(self.width - 1) {
                    let distance2 = i.abs_diff(row).pow(2) + j.abs_diff(col).pow(2);
                    if distance2 <= radius2 {
                        visible[i * self.width + j] = true;
                    }
                }
            }
        }

        visible
    }

    /// Moves the live ant at `from` to `to`.
    ///
    /// Returns whether a movement happened. Moving onto another live ant kills
    /// both ants, which still counts as a movement.
    pub fn move_entity(&mut self, from: Location, to: Location) -> bool {
        if !self.is_valid_move(from, to) {
            return false;
        }

        if self.get(to.0, to.1).is_some_and(Entity::is_live_ant) {
            for (row, col) in [from, to] {
                if let Some(Entity::Ant { alive, .. }) = self.get_mut(row, col) {
                    *alive = false;
                }
            }
            return true;
        }

        let (id, player, from_hill) = match self.get(from.0, from.1) {
            Some(Entity::Ant {
                id,
                player,
                on_hill,
                ..
            }) => (id.clone(), *player, *on_hill),
            _ => return false,
        };
        let to_hill = match self.get(to.0, to.1) {
            Some(Entity::Hill { player }) => Some(*player),
            _ => None,
        };

        self.set(
            to.0,
            to.1,
            Entity::Ant {
                id,
                player,
                alive: true,
                on_hill: to_hill,
            },
        );

        // Leave the hill behind if the ant was standing on one
        match from_hill {
            Some(owner) => self.set(from.0, from.1, Entity::Hill { player: owner }),
            None => self.remove(from.0, from.1),
        }

        true
    }

    /// Removes every dead ant, restoring the hill it was standing on.
    /// Returns how many ants were removed.
    pub fn remove_dead_ants(&mut self) -> usize {
        let dead: Vec<(Location, Option<usize>)> = self
            .ants()
            .into_iter()
            .filter_map(|(ant, location)| match ant {
                Entity::Ant {
                    alive: false,
                    on_hill,
                    ..
                } => Some((location, *on_hill)),
                _ => None,
            })
            .collect();

        for ((row, col), on_hill) in &dead {
            match on_hill {
                Some(owner) => self.set(*row, *col, Entity::Hill { player: *owner }),
                None => self.remove(*row, *col),
            }
        }

        dead.len()
    }

    fn new(width: usize, height: usize, players: usize) -> Map {
        Map {
            width,
            height,
            players,
            grid: vec![None; width * height],
        }
    }

    fn all(&self, filter: fn(&Entity) -> bool) -> Vec<(&Entity, Location)> {
        // Linear scan, maps are small enough for this to be fine
        self.grid
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| {
                cell.as_ref()
                    .filter(|entity| filter(entity))
                    .map(|entity| (entity, (index / self.width, index % self.width)))
            })
            .collect()
    }

    fn is_valid_move(&self, from: Location, to: Location) -> bool {
        if from == to || !self.contains(from) || !self.contains(to) {
            return false;
        }

        // Only live ants can move
        if !self.get(from.0, from.1).is_some_and(Entity::is_live_ant) {
            return false;
        }

        !self.get(to.0, to.1).is_some_and(Entity::blocks_movement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_parsing_a_map_it_is_created_with_the_correct_width_height_and_players() {
        let map = "\
            rows 2
            cols 3
            players 1
            m ...
            m .0.";
        let map = Map::parse(map).unwrap();

        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(map.players(), 1);
    }

    #[test]
    fn when_getting_a_cell_by_row_and_col_the_correct_entity_is_returned() {
        let map = "\
            rows 3
            cols 3
            players 2
            m .b.
            m *0%";
        let map = Map::parse(map).unwrap();

        assert!(map.get(0, 0).is_none());
        assert_eq!(map.get(0, 1).unwrap().player(), Some(1));
        assert!(map.get(0, 1).unwrap().is_live_ant());
        assert_eq!(map.get(1, 0), Some(&Entity::Food));
        assert_eq!(map.get(1, 1), Some(&Entity::Hill { player: 0 }));
        assert_eq!(map.get(1, 2), Some(&Entity::Water));
    }

    #[test]
    fn when_parsing_a_map_without_dimensions_an_error_is_returned() {
        let map = "\
            players 1
            m ..";

        assert_eq!(Map::parse(map), Err(MapError::MissingDimensions));
    }

    #[test]
    fn when_parsing_a_map_without_players_an_error_is_returned() {
        let map = "\
            rows 1
            cols 2
            m ..";

        assert_eq!(Map::parse(map), Err(MapError::MissingPlayers));
    }

    #[test]
    fn when_parsing_a_map_with_an_unknown_character_its_location_is_reported() {
        let map = "\
            rows 2
            cols 2
            players 1
            m ..
            m .?";

        assert_eq!(
            Map::parse(map),
            Err(MapError::InvalidCharacter {
                value: '?',
                row: 1,
                col: 1
            })
        );
    }

    #[test]
    fn when_parsing_a_map_with_too_many_rows_or_columns_an_error_is_returned() {
        let rows = "\
            rows 1
            cols 2
            players 1
            m ..
            m ..";
        let cols = "\
            rows 1
            cols 2
            players 1
            m ...";

        assert_eq!(Map::parse(rows), Err(MapError::TooManyRows { height: 1 }));
        assert_eq!(
            Map::parse(cols),
            Err(MapError::RowTooWide { row: 0, width: 2 })
        );
    }

    #[test]
    fn when_parsing_a_map_with_a_player_beyond_the_player_count_an_error_is_returned() {
        let map = "\
            rows 1
            cols 2
            players 1
            m 0b";

        assert_eq!(
            Map::parse(map),
            Err(MapError::PlayerOutOfRange {
                player: 1,
                players: 1,
                row: 0,
                col: 1
            })
        );
    }

    #[test]
    fn when_getting_the_ants_of_a_player_only_its_live_ants_are_returned() {
        let map = "\
            rows 3
            cols 3
            players 2
            m a.b
            m ..a
            m A..";
        let mut map = Map::parse(map).unwrap();
        if let Some(Entity::Ant { alive, .. }) = map.get_mut(1, 2) {
            *alive = false;
        }

        assert_eq!(map.ants_of(0), vec![(0, 0), (2, 0)]);
        assert_eq!(map.ants_of(1), vec![(0, 2)]);
    }

    #[test]
    fn when_getting_ant_hills_hills_under_ants_are_included() {
        let map = "\
            rows 2
            cols 2
            players 2
            m 0B
            m ..";
        let map = Map::parse(map).unwrap();

        assert_eq!(map.ant_hills(), vec![(0, (0, 0)), (1, (0, 1))]);
    }

    #[test]
    fn when_computing_visibility_only_cells_within_the_radius_are_visible() {
        let map = "\
            rows 5
            cols 5
            players 1
            m .....
            m .....
            m .....
            m .....
            m .....";
        let map = Map::parse(map).unwrap();

        let visible = map.visibility(&[(0, 0)], 2);
        let visible_cells: Vec<Location> = visible
            .iter()
            .enumerate()
            .filter(|(_, visible)| **visible)
            .map(|(index, _)| (index / 5, index % 5))
            .collect();

        assert_eq!(visible_cells, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn when_moving_an_ant_to_an_empty_cell_the_ant_is_moved() {
        let map = "\
            rows 3
            cols 3
            players 1
            m ...
            m .a.
            m ...";
        let mut map = Map::parse(map).unwrap();
        let did_move = map.move_entity((1, 1), (0, 1));

        assert!(did_move);
        assert!(map.get(1, 1).is_none());
        assert!(map.get(0, 1).unwrap().is_live_ant());
    }

    #[test]
    fn when_moving_an_ant_off_its_hill_the_hill_is_restored() {
        let map = "\
            rows 3
            cols 3
            players 1
            m ...
            m .A.
            m ...";
        let mut map = Map::parse(map).unwrap();
        let did_move = map.move_entity((1, 1), (0, 1));

        assert!(did_move);
        assert!(matches!(map.get(0, 1), Some(Entity::Ant { on_hill: None, .. })));
        assert_eq!(map.get(1, 1), Some(&Entity::Hill { player: 0 }));
    }

    #[test]
    fn when_moving_an_ant_to_a_hill_the_ant_stands_on_the_hill() {
        let map = "\
            rows 3
            cols 3
            players 2
            m ...
            m .a.
            m .1.";
        let mut map = Map::parse(map).unwrap();
        let did_move = map.move_entity((1, 1), (2, 1));

        assert!(did_move);
        assert!(map.get(1, 1).is_none());
        assert!(matches!(
            map.get(2, 1),
            Some(Entity::Ant {
                player: 0,
                on_hill: Some(1),
                ..
            })
        ));
    }

    #[test]
    fn when_moving_an_ant_to_water_or_food_movement_is_ignored() {
        let map = "\
            rows 3
            cols 3
            players 1
            m ...
            m .a*
            m .%.";
        let mut map = Map::parse(map).unwrap();

        assert!(!map.move_entity((1, 1), (2, 1)));
        assert!(!map.move_entity((1, 1), (1, 2)));
        assert!(map.get(1, 1).unwrap().is_live_ant());
    }

    #[test]
    fn when_moving_something_that_is_not_a_live_ant_movement_is_ignored() {
        let map = "\
            rows 3
            cols 3
            players 1
            m %..
            m .a.
            m ...";
        let mut map = Map::parse(map).unwrap();

        assert!(!map.move_entity((0, 0), (1, 0)));
        assert!(!map.move_entity((0, 1), (0, 2)));

        if let Some(Entity::Ant { alive, .. }) = map.get_mut(1, 1) {
            *alive = false;
        }
        assert!(!map.move_entity((1, 1), (1, 2)));
    }

    #[test]
    fn when_moving_an_ant_onto_another_live_ant_both_die() {
        let map = "\
            rows 1
            cols 3
            players 2
            m ab.";
        let mut map = Map::parse(map).unwrap();
        let did_move = map.move_entity((0, 0), (0, 1));

        assert!(did_move);
        assert!(!map.get(0, 0).unwrap().is_live_ant());
        assert!(!map.get(0, 1).unwrap().is_live_ant());
    }

    #[test]
    fn when_removing_dead_ants_hills_under_them_are_restored() {
        let map = "\
            rows 1
            cols 3
            players 1
            m Aa.";
        let mut map = Map::parse(map).unwrap();
        for col in 0..2 {
            if let Some(Entity::Ant { alive, .. }) = map.get_mut(0, col) {
                *alive = false;
            }
        }

        assert_eq!(map.remove_dead_ants(), 2);
        assert_eq!(map.get(0, 0), Some(&Entity::Hill { player: 0 }));
        assert!(map.get(0, 1).is_none());
    }
}
