//! Procedural dungeon: a perfect maze with rectangular rooms punched in.
//!
//! Output is text in the same symbol set as hand-written layouts, so it goes
//! through [`Map::from_rows`] like any other level.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::world::{Map, TileKind};

/// Maze carving starts here; it is always open.
pub const START_CELL: (usize, usize) = (1, 1);

const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonParams {
    pub width: usize,
    pub height: usize,
    pub seed: u64,
    pub room_attempts: u32,
    /// Room edge length bounds, border included.
    pub room_min: usize,
    pub room_max: usize,
}

impl Default for DungeonParams {
    fn default() -> Self {
        Self {
            width: 31,
            height: 31,
            seed: 0x5eed,
            room_attempts: 12,
            room_min: 4,
            room_max: 8,
        }
    }
}

/// Generated layout before conversion to tiles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dungeon {
    width: usize,
    height: usize,
    cells: Vec<TileKind>,
}

impl Dungeon {
    fn solid(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![TileKind::BlueBrick; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn kind(&self, x: usize, y: usize) -> TileKind {
        self.cells[y * self.width + x]
    }

    #[inline]
    pub fn is_open(&self, x: usize, y: usize) -> bool {
        self.kind(x, y) == TileKind::Floor
    }

    fn set(&mut self, x: usize, y: usize, kind: TileKind) {
        self.cells[y * self.width + x] = kind;
    }

    /// One string per row, in map-source symbols.
    pub fn rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().map(|k| k.symbol()).collect())
            .collect()
    }

    pub fn to_map(&self) -> Result<Map, MapError> {
        Map::from_rows(&self.rows())
    }
}

/// Randomised depth-first carve from [`START_CELL`] over a solid grid.
///
/// The walk is driven by an explicit stack of frames, each holding its own
/// shuffled direction order, so large mazes cannot overflow the call stack.
pub fn carve_maze<R: Rng>(width: usize, height: usize, rng: &mut R) -> Result<Dungeon, MapError> {
    if width < 5 || height < 5 {
        return Err(MapError::BadDimensions { width, height });
    }

    struct Frame {
        x: usize,
        y: usize,
        dirs: [(i32, i32); 4],
        next: usize,
    }

    let shuffled = |rng: &mut R| {
        let mut dirs = DIRECTIONS;
        dirs.shuffle(rng);
        dirs
    };

    let mut d = Dungeon::solid(width, height);
    let (sx, sy) = START_CELL;
    d.set(sx, sy, TileKind::Floor);
    let mut stack = vec![Frame {
        x: sx,
        y: sy,
        dirs: shuffled(rng),
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        if frame.next == frame.dirs.len() {
            stack.pop();
            continue;
        }
        let (dx, dy) = frame.dirs[frame.next];
        frame.next += 1;

        let fx = frame.x as i32 + 2 * dx;
        let fy = frame.y as i32 + 2 * dy;
        // Far cell must stay strictly inside the border.
        if fx <= 0 || fy <= 0 || fx >= width as i32 - 1 || fy >= height as i32 - 1 {
            continue;
        }
        let (fx, fy) = (fx as usize, fy as usize);
        if d.is_open(fx, fy) {
            continue;
        }

        let mx = (frame.x as i32 + dx) as usize;
        let my = (frame.y as i32 + dy) as usize;
        d.set(mx, my, TileKind::Floor);
        d.set(fx, fy, TileKind::Floor);
        stack.push(Frame {
            x: fx,
            y: fy,
            dirs: shuffled(rng),
            next: 0,
        });
    }

    Ok(d)
}

/// Try `attempts` random rooms; overlapping ones are skipped, not retried.
/// Returns how many were placed.
pub fn insert_rooms<R: Rng>(
    d: &mut Dungeon,
    attempts: u32,
    min: usize,
    max: usize,
    rng: &mut R,
) -> usize {
    if min == 0 || min > max {
        return 0;
    }
    let mut interior = vec![false; d.width * d.height];
    let mut placed = 0;

    for attempt in 0..attempts {
        let rw = rng.random_range(min..=max);
        let rh = rng.random_range(min..=max);
        // Room plus the outer border must fit.
        if rw + 2 > d.width || rh + 2 > d.height {
            continue;
        }
        let x0 = rng.random_range(1..=d.width - 1 - rw);
        let y0 = rng.random_range(1..=d.height - 1 - rh);
        let (x1, y1) = (x0 + rw - 1, y0 + rh - 1);

        let overlaps = (y0 + 1..y1)
            .flat_map(|y| (x0 + 1..x1).map(move |x| (x, y)))
            .any(|(x, y)| interior[y * d.width + x]);
        if overlaps {
            log::debug!("room attempt {attempt} at ({x0}, {y0}) {rw}x{rh} overlaps, skipped");
            continue;
        }

        let material = TileKind::WALLS[rng.random_range(0..TileKind::WALLS.len())];
        for y in y0..=y1 {
            for x in x0..=x1 {
                let edge = x == x0 || x == x1 || y == y0 || y == y1;
                if edge {
                    if !d.is_open(x, y) {
                        d.set(x, y, material);
                    }
                } else {
                    d.set(x, y, TileKind::Floor);
                    interior[y * d.width + x] = true;
                }
            }
        }
        placed += 1;
    }

    placed
}

/// Maze plus rooms, deterministic for a given seed.
pub fn generate(params: &DungeonParams) -> Result<Dungeon, MapError> {
    let mut rng = Pcg32::seed_from_u64(params.seed);
    let mut d = carve_maze(params.width, params.height, &mut rng)?;
    let rooms = insert_rooms(
        &mut d,
        params.room_attempts,
        params.room_min,
        params.room_max,
        &mut rng,
    );
    log::debug!(
        "dungeon {}x{} seed {:#x}: {rooms}/{} rooms placed",
        params.width,
        params.height,
        params.seed,
        params.room_attempts
    );
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    fn reachable_open_cells(d: &Dungeon) -> usize {
        let mut seen = vec![false; d.width() * d.height()];
        let mut queue = VecDeque::from([START_CELL]);
        seen[START_CELL.1 * d.width() + START_CELL.0] = true;
        let mut count = 0;
        while let Some((x, y)) = queue.pop_front() {
            count += 1;
            for (dx, dy) in DIRECTIONS {
                let nx = (x as i32 + dx) as usize;
                let ny = (y as i32 + dy) as usize;
                if d.is_open(nx, ny) && !seen[ny * d.width() + nx] {
                    seen[ny * d.width() + nx] = true;
                    queue.push_back((nx, ny));
                }
            }
        }
        count
    }

    fn open_cells(d: &Dungeon) -> usize {
        (0..d.height())
            .flat_map(|y| (0..d.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| d.is_open(x, y))
            .count()
    }

    fn has_open_2x2(d: &Dungeon) -> bool {
        (0..d.height() - 1).any(|y| {
            (0..d.width() - 1).any(|x| {
                d.is_open(x, y) && d.is_open(x + 1, y) && d.is_open(x, y + 1) && d.is_open(x + 1, y + 1)
            })
        })
    }

    #[test]
    fn too_small_rejected() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(
            carve_maze(4, 9, &mut rng).unwrap_err(),
            MapError::BadDimensions { width: 4, height: 9 }
        );
    }

    #[test]
    fn same_seed_same_dungeon() {
        let params = DungeonParams::default();
        assert_eq!(generate(&params).unwrap(), generate(&params).unwrap());
    }

    #[test]
    fn generated_dungeon_builds_a_map() {
        let d = generate(&DungeonParams::default()).unwrap();
        let map = d.to_map().unwrap();
        assert_eq!((map.width(), map.height()), (31, 31));
        assert!(map.is_passable(crate::geometry::Vec2i::new(1, 1)));
    }

    #[test]
    fn rooms_open_their_interior() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut d = carve_maze(21, 21, &mut rng).unwrap();
        let placed = insert_rooms(&mut d, 1, 5, 5, &mut rng);
        assert_eq!(placed, 1);
        assert!(has_open_2x2(&d));
    }

    proptest! {
        #[test]
        fn maze_is_perfect(seed in any::<u64>(), w in 5usize..40, h in 5usize..40) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let d = carve_maze(w, h, &mut rng).unwrap();
            prop_assert_eq!(reachable_open_cells(&d), open_cells(&d));
            prop_assert!(!has_open_2x2(&d));
        }

        #[test]
        fn border_stays_solid_after_rooms(seed in any::<u64>()) {
            let params = DungeonParams { seed, ..DungeonParams::default() };
            let d = generate(&params).unwrap();
            for x in 0..d.width() {
                prop_assert!(!d.is_open(x, 0));
                prop_assert!(!d.is_open(x, d.height() - 1));
            }
            for y in 0..d.height() {
                prop_assert!(!d.is_open(0, y));
                prop_assert!(!d.is_open(d.width() - 1, y));
            }
        }
    }
}
