use crate::map::MapError;
use crossterm::style::Color;
use uuid::Uuid;

/// Anything that can occupy a cell of the map. Land is the absence of an entity.
#[derive(Clone, Debug, PartialEq)]
pub enum Entity {
    Ant {
        id: String,
        player: usize,
        alive: bool,
        // Owner of the hill the ant is standing on, if any
        on_hill: Option<usize>,
    },
    Food,
    Hill {
        player: usize,
    },
    Water,
}

impl Entity {
    pub fn ant(player: usize, on_hill: Option<usize>) -> Entity {
        Entity::Ant {
            id: Uuid::new_v4().to_string(),
            player,
            alive: true,
            on_hill,
        }
    }

    pub fn from_char(value: char) -> Result<Option<Entity>, char> {
        match value {
            // Ignore land entities to reduce memory usage
            '.' => Ok(None),
            // Max 10 players, 'a' is player 0 and so on
            'a'..='j' => Ok(Some(Entity::ant(value as usize - 'a' as usize, None))),
            // An ant standing on its own hill
            'A'..='J' => {
                let player = value as usize - 'A' as usize;
                Ok(Some(Entity::ant(player, Some(player))))
            }
            '*' => Ok(Some(Entity::Food)),
            '0'..='9' => Ok(Some(Entity::Hill {
                player: value as usize - '0' as usize,
            })),
            '%' => Ok(Some(Entity::Water)),
            _ => Err(value),
        }
    }

    pub fn player(&self) -> Option<usize> {
        match self {
            Entity::Ant { player, .. } | Entity::Hill { player } => Some(*player),
            _ => None,
        }
    }

    pub fn is_live_ant(&self) -> bool {
        matches!(self, Entity::Ant { alive: true, .. })
    }

    pub fn blocks_movement(&self) -> bool {
        matches!(
            self,
            Entity::Water | Entity::Food | Entity::Ant { alive: false, .. }
        )
    }
}

pub(crate) fn check_player(
    entity: &Entity,
    players: usize,
    row: usize,
    col: usize,
) -> Result<(), MapError> {
    match entity.player() {
        Some(player) if player >= players => Err(MapError::PlayerOutOfRange {
            player,
            players,
            row,
            col,
        }),
        _ => Ok(()),
    }
}

pub fn player_to_color(player: usize) -> Color {
    match player {
        0 => Color::Red,
        1 => Color::Green,
        2 => Color::Blue,
        3 => Color::Yellow,
        4 => Color::Magenta,
        5 => Color::Cyan,
        6 => Color::DarkRed,
        7 => Color::DarkGreen,
        8 => Color::DarkMagenta,
        _ => Color::DarkYellow,
    }
}
