use crate::error::MapError;
use crate::geometry::Vec2i;
use crate::texture::{Color, TextureId};

/// The built-in level: a small room with three wall materials.
pub const DEFAULT_LAYOUT: [&str; 5] = ["BBBBBB", "G    B", "B  B B", "O    B", "BBBBBB"];

/// Map-source symbols. Anything unrecognised is [`TileKind::Unknown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    Floor,
    BlueBrick,
    Wood,
    Eagle,
    RedBrick,
    Mossy,
    ColorStone,
    Unknown,
}

impl TileKind {
    /// Wall materials the dungeon generator may pick for room borders.
    pub const WALLS: [TileKind; 6] = [
        TileKind::BlueBrick,
        TileKind::Wood,
        TileKind::Eagle,
        TileKind::RedBrick,
        TileKind::Mossy,
        TileKind::ColorStone,
    ];

    /// Total: unknown symbols map to the error tile instead of failing.
    pub fn from_char(c: char) -> Self {
        match c {
            ' ' => TileKind::Floor,
            'B' => TileKind::BlueBrick,
            'G' => TileKind::Wood,
            'O' => TileKind::Eagle,
            'R' => TileKind::RedBrick,
            'M' => TileKind::Mossy,
            'C' => TileKind::ColorStone,
            _ => TileKind::Unknown,
        }
    }

    /// Symbol written by the generator. `Unknown` renders as `?`.
    pub fn symbol(self) -> char {
        match self {
            TileKind::Floor => ' ',
            TileKind::BlueBrick => 'B',
            TileKind::Wood => 'G',
            TileKind::Eagle => 'O',
            TileKind::RedBrick => 'R',
            TileKind::Mossy => 'M',
            TileKind::ColorStone => 'C',
            TileKind::Unknown => '?',
        }
    }

    pub const fn tile(self) -> Tile {
        match self {
            TileKind::Floor => Tile::new(Color::WHITE, TextureId::GreyStone, true),
            TileKind::BlueBrick => Tile::new(Color::BLUE, TextureId::BlueBrick, false),
            TileKind::Wood => Tile::new(Color::GREEN, TextureId::Wood, false),
            TileKind::Eagle => Tile::new(Color::ORANGE, TextureId::Eagle, false),
            TileKind::RedBrick => Tile::new(Color::RED, TextureId::RedBrick, false),
            TileKind::Mossy => Tile::new(Color::MOSS, TextureId::Mossy, false),
            TileKind::ColorStone => Tile::new(Color::TEAL, TextureId::ColorStone, false),
            TileKind::Unknown => Tile::new(Color::PURPLE, TextureId::PurpleStone, false),
        }
    }
}

/// One grid cell. Immutable once built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub fill: Color,
    pub texture: TextureId,
    pub passable: bool,
}

impl Tile {
    pub const fn new(fill: Color, texture: TextureId, passable: bool) -> Self {
        Self {
            fill,
            texture,
            passable,
        }
    }

    #[inline]
    pub fn from_char(c: char) -> Self {
        TileKind::from_char(c).tile()
    }
}

/// Rectangular tile grid, fully enclosed by impassable tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct Map {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Map {
    /// Build from text rows. Rows must share one width and the border must
    /// be solid; interior symbols never fail.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, MapError> {
        let width = rows.first().map(|r| r.as_ref().chars().count()).unwrap_or(0);
        if rows.is_empty() || width == 0 {
            return Err(MapError::Empty);
        }

        let mut tiles = Vec::with_capacity(width * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let before = tiles.len();
            tiles.extend(line.as_ref().chars().map(Tile::from_char));
            let found = tiles.len() - before;
            if found != width {
                return Err(MapError::Ragged {
                    row,
                    expected: width,
                    found,
                });
            }
        }

        let map = Self {
            width,
            height: rows.len(),
            tiles,
        };
        map.check_enclosed()?;
        Ok(map)
    }

    /// The built-in demo level.
    pub fn demo() -> Result<Self, MapError> {
        Self::from_rows(&DEFAULT_LAYOUT)
    }

    fn check_enclosed(&self) -> Result<(), MapError> {
        for y in 0..self.height {
            for x in 0..self.width {
                let border = x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height;
                if border && self.tiles[y * self.width + x].passable {
                    return Err(MapError::Unenclosed { x, y });
                }
            }
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel size of the top-down view at `block_px` pixels per block.
    pub fn size_px(&self, block_px: usize) -> (usize, usize) {
        (self.width * block_px, self.height * block_px)
    }

    #[inline]
    pub fn in_bounds(&self, cell: Vec2i) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }

    /// Tile at `cell`, or `None` outside the grid.
    #[inline]
    pub fn get(&self, cell: Vec2i) -> Option<&Tile> {
        if self.in_bounds(cell) {
            Some(&self.tiles[cell.y as usize * self.width + cell.x as usize])
        } else {
            None
        }
    }

    /// Out-of-range cells count as blocked.
    #[inline]
    pub fn is_passable(&self, cell: Vec2i) -> bool {
        self.get(cell).is_some_and(|t| t.passable)
    }

    /// Iterate `(cell, tile)` in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = (Vec2i, &Tile)> {
        let w = self.width;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, t)| (Vec2i::new((i % w) as i32, (i / w) as i32), t))
    }
}
