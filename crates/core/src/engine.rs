//! The selection game: pool, selection, bins and round lifecycle behind one
//! facade driven by pointer events and an explicit clock.

use std::time::Duration;

use tracing::{debug, info};

use crate::{
    config::GameConfig,
    error::{ConfigError, GameError},
    geometry::Point,
    layout::{OrbitLayout, TileLayout},
    pool::{Tile, TileId, TilePool},
    scheduler::{Scheduler, TaskHandle},
    scoring::{Bin, Deposit, Outcome, Round},
    selection::{SelectionController, SelectionStart},
    snapshot::{BinView, GameSnapshot, TileView},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredTask {
    ClearSpawning,
}

/// Summary of an accepted deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositReceipt {
    /// Target bin.
    pub bin: usize,
    /// Slots that were deposited and respawned, ascending.
    pub tiles: Vec<TileId>,
    /// Values appended to the bin.
    pub values: Vec<u32>,
    /// Weight added to the bin and the aggregate.
    pub weight: u32,
    /// Outcome reached by this deposit, if any.
    pub outcome: Option<Outcome>,
}

/// Single-threaded game engine. All state changes happen through its
/// methods; time only moves through [`tick`](Self::tick).
pub struct SelectionGame {
    config: GameConfig,
    pool: TilePool,
    layout: Box<dyn TileLayout>,
    selection: SelectionController,
    round: Round,
    scheduler: Scheduler<DeferredTask>,
    spawn_clear: Option<TaskHandle>,
    clock: Duration,
}

impl SelectionGame {
    /// Validate `config` and start the first round at clock zero.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut game = Self {
            pool: TilePool::new(&config),
            layout: Box::new(OrbitLayout::new(config.layout)),
            selection: SelectionController::new(),
            round: Round::new(config.bin_count),
            scheduler: Scheduler::new(),
            spawn_clear: None,
            clock: Duration::ZERO,
            config,
        };
        game.start_round();
        Ok(game)
    }

    /// Replace the position model used for hit-testing.
    pub fn with_layout(mut self, layout: impl TileLayout + 'static) -> Self {
        self.set_layout(layout);
        self
    }

    /// Replace the position model, e.g. with bounds measured for this frame.
    pub fn set_layout(&mut self, layout: impl TileLayout + 'static) {
        self.layout = Box::new(layout);
    }

    /// Pointer down at `point`. Pressing an already selected tile keeps the
    /// selection for a drag to a bin; anything else starts a new rectangle.
    pub fn begin_selection(&mut self, point: Point) -> SelectionStart {
        let pressed = self.selected_tile_at(point);
        self.selection.begin(point, pressed)
    }

    /// Pointer moved to `point`; reselects against the live layout.
    pub fn update_selection(&mut self, point: Point) -> bool {
        let now = self.clock;
        let layout = &self.layout;
        let bounds = self
            .pool
            .tiles()
            .iter()
            .filter_map(|tile| layout.bounds(tile, now).map(|bounds| (tile.id, bounds)));
        self.selection.update(point, bounds)
    }

    /// Pointer released; the selection persists.
    pub fn end_selection(&mut self) -> bool {
        self.selection.end()
    }

    /// Move the current selection into `bin`.
    ///
    /// An empty selection is a no-op returning `Ok(None)`. Rejections leave
    /// every piece of state, including the selection, untouched.
    pub fn deposit(&mut self, bin: usize) -> Result<Option<DepositReceipt>, GameError> {
        if self.selection.is_empty() {
            return Ok(None);
        }
        self.round.ensure_accepting(bin)?;

        let tiles = self.selection.take();
        self.selection.clear();
        let deposits: Vec<Deposit> = tiles
            .iter()
            .filter_map(|id| self.pool.get(*id))
            .map(|tile| Deposit {
                value: tile.value,
                weight: tile.weight,
            })
            .collect();
        let weight = self
            .round
            .record(bin, &deposits, &self.config.termination)?;

        self.pool.respawn(tiles.iter().copied(), self.clock);
        self.schedule_spawn_clear();

        let outcome = self.round.outcome();
        debug!(
            bin,
            tiles = tiles.len(),
            weight,
            aggregate = self.round.aggregate(),
            "deposit accepted"
        );
        if let Some(outcome) = outcome {
            info!(?outcome, aggregate = self.round.aggregate(), "round finished");
        }

        Ok(Some(DepositReceipt {
            bin,
            values: deposits.iter().map(|deposit| deposit.value).collect(),
            tiles,
            weight,
            outcome,
        }))
    }

    /// Abandon the current round and start a fresh one.
    pub fn reset(&mut self) {
        self.scheduler.clear();
        self.spawn_clear = None;
        self.selection.clear();
        self.round = Round::new(self.config.bin_count);
        self.start_round();
    }

    /// Advance the engine clock to `now` and run due deferred tasks.
    /// Instants earlier than the current clock are ignored. Returns the
    /// number of tasks that ran.
    pub fn tick(&mut self, now: Duration) -> usize {
        if now < self.clock {
            return 0;
        }
        self.clock = now;
        let due = self.scheduler.take_due(now);
        for task in &due {
            match task {
                DeferredTask::ClearSpawning => {
                    self.pool.clear_spawning();
                    self.spawn_clear = None;
                }
            }
        }
        due.len()
    }

    /// Topmost tile whose live bounds contain `point`.
    pub fn tile_at(&self, point: Point) -> Option<TileId> {
        self.pool
            .tiles()
            .iter()
            .rev()
            .find(|tile| self.contains(tile, point))
            .map(|tile| tile.id)
    }

    /// Build the read-only view for renderers.
    pub fn snapshot(&self) -> GameSnapshot {
        let mode = &self.config.termination;
        let tiles = self
            .pool
            .tiles()
            .iter()
            .map(|tile| TileView {
                id: tile.id,
                value: tile.value,
                weight: tile.weight,
                bounds: self.layout.bounds(tile, self.clock),
                spawning: tile.spawning,
                selected: self.selection.is_selected(tile.id),
                draggable: self.selection.is_draggable(tile.id),
            })
            .collect();
        let bins = self
            .round
            .bins()
            .iter()
            .enumerate()
            .map(|(index, bin)| BinView {
                index,
                values: bin.values().to_vec(),
                score: bin.score(),
                fill_percent: mode.bin_percent(bin),
            })
            .collect();

        GameSnapshot {
            clock_ms: self.clock.as_millis(),
            tiles,
            selected: self.selection.selected().collect(),
            selection_box: self.selection.rect().map(|rect| rect.bounding_box()),
            bins,
            aggregate: self.round.aggregate(),
            deposited: self.round.deposited(),
            progress_percent: mode.progress_percent(&self.round),
            game_over: self.round.is_over(),
            game_won: self.round.is_won(),
            outcome: self.round.outcome(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current engine clock.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn tiles(&self) -> &[Tile] {
        self.pool.tiles()
    }

    /// Tile in slot `id`.
    pub fn tile(&self, id: TileId) -> Result<&Tile, GameError> {
        self.pool.get(id).ok_or(GameError::InvalidTile {
            id,
            pool_size: self.pool.len(),
        })
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn bins(&self) -> &[Bin] {
        self.round.bins()
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    /// When the pending "just spawned" clear will run, if one is scheduled.
    pub fn spawn_clear_due(&self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    fn start_round(&mut self) {
        self.pool.initialize(self.config.pool_size, self.clock);
        self.schedule_spawn_clear();
        info!(
            pool_size = self.config.pool_size,
            bins = self.config.bin_count,
            "round started"
        );
    }

    fn schedule_spawn_clear(&mut self) {
        // last writer wins: one pending clear covers every spawning tile
        let due = self.clock + self.config.spawn_clear_delay();
        let previous = self.spawn_clear.take();
        let handle = self
            .scheduler
            .reschedule(previous, due, DeferredTask::ClearSpawning);
        self.spawn_clear = Some(handle);
    }

    fn selected_tile_at(&self, point: Point) -> Option<TileId> {
        self.tile_at(point).filter(|id| self.selection.is_selected(*id))
    }

    fn contains(&self, tile: &Tile, point: Point) -> bool {
        self.layout
            .bounds(tile, self.clock)
            .is_some_and(|bounds| bounds.contains(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ValueRange, geometry::BoundingBox, layout::StaticLayout,
        scoring::TerminationMode,
    };

    /// Tile `i` sits in a 4x4 box at x = 10 * i on a single row.
    fn row_layout(n: usize) -> StaticLayout {
        (0..n)
            .map(|id| (id, BoundingBox::new(id as f32 * 10.0, 0.0, 4.0, 4.0)))
            .collect()
    }

    fn game_with(config: GameConfig) -> SelectionGame {
        let pool_size = config.pool_size;
        SelectionGame::new(config)
            .expect("valid config")
            .with_layout(row_layout(pool_size))
    }

    fn fixed_weight(weight: u32) -> GameConfig {
        GameConfig {
            weights: ValueRange::new(weight, weight),
            seed: Some(11),
            ..GameConfig::default()
        }
    }

    /// Drag across tiles `from..to` and release.
    fn select(game: &mut SelectionGame, from: usize, to: usize) {
        assert_eq!(
            game.begin_selection(Point::new(from as f32 * 10.0 + 1.0, 1.0)),
            SelectionStart::Started
        );
        game.update_selection(Point::new((to - 1) as f32 * 10.0 + 2.0, 2.0));
        game.end_selection();
        let expected: Vec<TileId> = (from..to).collect();
        assert_eq!(game.selection().selected().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn five_tiles_of_twenty_fill_a_bin_to_one_hundred() {
        let mut game = game_with(fixed_weight(20));
        assert_eq!(game.tiles().len(), 100);

        select(&mut game, 0, 5);
        let receipt = game.deposit(0).unwrap().expect("deposit accepted");
        assert_eq!(receipt.weight, 100);
        assert_eq!(receipt.tiles, vec![0, 1, 2, 3, 4]);
        assert_eq!(receipt.outcome, None);

        let snapshot = game.snapshot();
        assert_eq!(snapshot.bins[0].score, 100);
        assert_eq!(snapshot.bins[0].values.len(), 5);
        assert_eq!(snapshot.aggregate, 100);
        assert!(!snapshot.game_over);
        assert!(!snapshot.game_won);
        assert!(snapshot.selected.is_empty());
        assert_eq!(snapshot.tiles.len(), 100);
    }

    #[test]
    fn deposit_conserves_weight_and_respawns_only_the_selection() {
        let config = GameConfig {
            seed: Some(5),
            ..GameConfig::default()
        };
        let mut game = game_with(config);
        game.tick(Duration::from_secs(1));
        assert!(game.tiles().iter().all(|tile| !tile.spawning));

        select(&mut game, 10, 17);
        let before = game.tiles().to_vec();
        let expected: u32 = before[10..17].iter().map(|tile| tile.weight).sum();
        let values: Vec<u32> = before[10..17].iter().map(|tile| tile.value).collect();

        let receipt = game.deposit(2).unwrap().unwrap();
        assert_eq!(receipt.weight, expected);
        assert_eq!(receipt.values, values);
        assert_eq!(game.bins()[2].score(), expected);
        assert_eq!(game.bins()[2].values(), values.as_slice());
        assert_eq!(game.round().aggregate(), expected);

        for (old, new) in before.iter().zip(game.tiles()) {
            assert_eq!(old.id, new.id);
            if (10..17).contains(&old.id) {
                assert!(new.spawning);
                assert_eq!(new.spawned_at, Duration::from_secs(1));
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn empty_deposit_changes_nothing() {
        let mut game = game_with(fixed_weight(20));
        let before = game.snapshot();
        assert_eq!(game.deposit(1), Ok(None));
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn unknown_bin_keeps_the_selection() {
        let mut game = game_with(fixed_weight(20));
        select(&mut game, 0, 3);
        let before = game.snapshot();
        assert_eq!(
            game.deposit(7),
            Err(GameError::UnknownBin { bin: 7, bins: 3 })
        );
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn filling_every_bin_wins() {
        let mut game = game_with(fixed_weight(25));
        for bin in 0..3 {
            select(&mut game, bin * 10, bin * 10 + 10);
            game.deposit(bin).unwrap();
        }
        let snapshot = game.snapshot();
        assert_eq!(snapshot.aggregate, 750);
        assert!(snapshot.game_over);
        assert!(snapshot.game_won);
        assert_eq!(snapshot.outcome, Some(Outcome::Won));
    }

    #[test]
    fn overflowing_the_aggregate_loses_and_locks_the_round() {
        let mut game = game_with(fixed_weight(40));
        select(&mut game, 0, 25);
        let receipt = game.deposit(0).unwrap().unwrap();
        assert_eq!(receipt.weight, 1000);
        assert_eq!(receipt.outcome, Some(Outcome::Lost));

        let snapshot = game.snapshot();
        assert!(snapshot.game_over);
        assert!(!snapshot.game_won);

        select(&mut game, 30, 32);
        assert_eq!(game.deposit(1), Err(GameError::RoundOver));
        assert_eq!(game.bins()[1].score(), 0);
    }

    #[test]
    fn reset_restores_a_fresh_round() {
        let mut game = game_with(fixed_weight(40));
        select(&mut game, 0, 25);
        game.deposit(0).unwrap();
        game.begin_selection(Point::new(51.0, 1.0));
        game.tick(Duration::from_secs(3));

        game.reset();
        let snapshot = game.snapshot();
        assert_eq!(snapshot.tiles.len(), 100);
        assert!(snapshot.tiles.iter().all(|tile| tile.spawning));
        assert!(snapshot.bins.iter().all(|bin| bin.values.is_empty() && bin.score == 0));
        assert_eq!(snapshot.aggregate, 0);
        assert_eq!(snapshot.deposited, 0);
        assert_eq!(snapshot.progress_percent, 0.0);
        assert!(!snapshot.game_over);
        assert!(!snapshot.game_won);
        assert!(snapshot.selected.is_empty());
        assert!(snapshot.selection_box.is_none());
        assert_eq!(game.spawn_clear_due(), Some(Duration::from_millis(3_500)));
    }

    #[test]
    fn respawn_supersedes_the_pending_flag_clear() {
        let mut game = game_with(fixed_weight(20));
        assert_eq!(game.spawn_clear_due(), Some(Duration::from_millis(500)));

        game.tick(Duration::from_millis(300));
        select(&mut game, 0, 2);
        game.deposit(0).unwrap();
        assert_eq!(game.spawn_clear_due(), Some(Duration::from_millis(800)));

        assert_eq!(game.tick(Duration::from_millis(500)), 0);
        assert!(game.tile(0).unwrap().spawning);

        assert_eq!(game.tick(Duration::from_millis(800)), 1);
        assert!(game.tiles().iter().all(|tile| !tile.spawning));
        assert_eq!(game.spawn_clear_due(), None);
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut game = game_with(fixed_weight(20));
        game.tick(Duration::from_secs(2));
        assert_eq!(game.tick(Duration::from_secs(1)), 0);
        assert_eq!(game.clock(), Duration::from_secs(2));
    }

    #[test]
    fn pressing_a_selected_tile_starts_a_drag() {
        let mut game = game_with(fixed_weight(20));
        select(&mut game, 3, 6);
        assert_eq!(
            game.begin_selection(Point::new(41.0, 2.0)),
            SelectionStart::DragExisting
        );
        assert!(game.snapshot().tiles[4].draggable);
        let receipt = game.deposit(1).unwrap().unwrap();
        assert_eq!(receipt.tiles, vec![3, 4, 5]);

        // empty space starts a fresh rectangle and drops the old selection
        select(&mut game, 7, 8);
        assert_eq!(
            game.begin_selection(Point::new(95.0, 2.0)),
            SelectionStart::Started
        );
        assert!(game.selection().is_empty());
        assert!(game.snapshot().selection_box.is_some());
    }

    #[test]
    fn pressing_a_tile_drawn_over_the_selection_starts_fresh() {
        let layout: StaticLayout = [
            (0, BoundingBox::new(0.0, 0.0, 4.0, 4.0)),
            (1, BoundingBox::new(2.0, 0.0, 4.0, 4.0)),
        ]
        .into_iter()
        .collect();
        let mut game = SelectionGame::new(fixed_weight(20))
            .expect("valid config")
            .with_layout(layout);

        game.begin_selection(Point::new(1.0, 1.0));
        game.update_selection(Point::new(1.5, 1.0));
        game.end_selection();
        assert_eq!(game.selection().selected().collect::<Vec<_>>(), vec![0]);

        // tile 1 covers the right half of tile 0
        assert_eq!(game.tile_at(Point::new(3.0, 1.0)), Some(1));
        assert_eq!(
            game.begin_selection(Point::new(1.0, 1.0)),
            SelectionStart::DragExisting
        );
        assert_eq!(
            game.begin_selection(Point::new(3.0, 1.0)),
            SelectionStart::Started
        );
        assert!(game.selection().is_empty());
    }

    #[test]
    fn selection_follows_live_orbit_positions() {
        let config = GameConfig {
            seed: Some(9),
            ..GameConfig::default()
        };
        let mut game = SelectionGame::new(config).unwrap();
        game.tick(Duration::from_millis(2_750));

        let snapshot = game.snapshot();
        let bounds = snapshot.tiles[42].bounds.unwrap();
        let center = bounds.center();
        assert_eq!(game.tile_at(center), Some(42));

        game.begin_selection(Point::new(center.x - 0.1, center.y - 0.1));
        game.update_selection(Point::new(center.x + 0.1, center.y + 0.1));
        assert_eq!(game.selection().selected().collect::<Vec<_>>(), vec![42]);
        assert!(!game.snapshot().tiles[42].draggable);
        game.end_selection();
        assert!(game.snapshot().tiles[42].draggable);
    }

    #[test]
    fn simple_progress_mode_completes_without_losing() {
        let config = GameConfig {
            bin_count: 4,
            termination: TerminationMode::SimpleProgress {
                denominator: 8,
                target_percent: 100,
            },
            ..fixed_weight(40)
        };
        let mut game = game_with(config);
        select(&mut game, 0, 4);
        game.deposit(3).unwrap();
        let snapshot = game.snapshot();
        assert_eq!(snapshot.progress_percent, 50.0);
        assert_eq!(snapshot.bins[3].fill_percent, None);
        assert!(!snapshot.game_over);

        select(&mut game, 4, 8);
        let receipt = game.deposit(0).unwrap().unwrap();
        assert_eq!(receipt.outcome, Some(Outcome::Won));
        assert!(game.snapshot().game_won);
    }

    #[test]
    fn invalid_tile_reference_is_reported() {
        let game = game_with(fixed_weight(20));
        assert_eq!(
            game.tile(100).unwrap_err(),
            GameError::InvalidTile {
                id: 100,
                pool_size: 100
            }
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = GameConfig {
            bin_count: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            SelectionGame::new(config),
            Err(ConfigError::NoBins)
        ));
    }

    #[test]
    fn snapshot_serializes_for_logging() {
        let mut game = game_with(fixed_weight(20));
        select(&mut game, 0, 2);
        let json = game.snapshot().to_json().unwrap();
        assert!(json.contains("\"game_over\":false"));
        assert!(json.contains("\"selected\":[0,1]"));
    }
}
