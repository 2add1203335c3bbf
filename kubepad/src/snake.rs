//! Snake on the 8×8 squares.
//!
//! The game takes over the pad while it runs.  The main loop calls
//! [`SnakeGame::tick`] every frame and the game steps once its interval has
//! passed, so nothing here sleeps or spawns threads.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use launchpad_mk2::{Button, Color, Pad, PadCommand, PadEvent, Square};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};

pub const START: Square = Square::new(0, 3);
pub const SNAKE_COLOR: Color = Color::PURPLE;
pub const FOOD_COLOR: Color = Color::LIGHT_GREEN;
pub const ABORT_BUTTON: Button = Button::User2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Moved(Vec<PadCommand>),
    GameOver { score: u32 },
}

pub struct SnakeGame {
    /// Tail first, head last.
    snake:     VecDeque<Square>,
    food:      Vec<Square>,
    direction: Direction,
    score:     u32,
    running:   bool,
    next_step: Instant,
    rng:       StdRng,
}

impl Default for SnakeGame {
    fn default() -> Self {
        Self::new()
    }
}

impl SnakeGame {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic food placement.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        SnakeGame {
            snake:     VecDeque::new(),
            food:      Vec::new(),
            direction: Direction::Up,
            score:     0,
            running:   false,
            next_step: Instant::now(),
            rng,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn head(&self) -> Option<Square> {
        self.snake.back().copied()
    }

    pub fn snake(&self) -> impl Iterator<Item = &Square> {
        self.snake.iter()
    }

    pub fn food(&self) -> &[Square] {
        &self.food
    }

    /// Time between steps; the snake speeds up as it eats.
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(500 + 50 * self.score as u64)
    }

    /// Start a new game and return the commands that draw it.
    pub fn start(&mut self, now: Instant) -> Vec<PadCommand> {
        info!("starting snake");
        self.running = true;
        self.snake.clear();
        self.snake.push_back(START);
        self.food.clear();
        self.direction = Direction::Up;
        self.score = 0;
        self.next_step = now + self.step_interval();

        let mut commands = vec![
            PadCommand::Reset,
            PadCommand::light(ABORT_BUTTON, Color::YELLOW),
            PadCommand::light(START, SNAKE_COLOR),
        ];
        commands.extend(self.spawn_food());
        commands
    }

    /// Steer with a square press; USER_2 aborts.  Returns true when the
    /// press ended the game.
    pub fn on_pad_event(&mut self, event: PadEvent) -> bool {
        if !self.running || !event.is_pressed() {
            return false;
        }
        let square = match event.pad() {
            Pad::Button(b) if b == ABORT_BUTTON => {
                info!(score = self.score, "snake aborted");
                self.running = false;
                return true;
            }
            Pad::Button(_) => return false,
            Pad::Square(s) => s,
        };
        let Some(head) = self.head() else { return false };
        debug!(%square, "snake turn");
        self.direction = match self.direction {
            Direction::Up | Direction::Down => {
                if square.column < head.column { Direction::Left } else { Direction::Right }
            }
            Direction::Left | Direction::Right => {
                if square.row < head.row { Direction::Down } else { Direction::Up }
            }
        };
        false
    }

    /// Step when the interval has passed.
    pub fn tick(&mut self, now: Instant) -> Option<Step> {
        if !self.running || now < self.next_step {
            return None;
        }
        let step = self.step();
        self.next_step = now + self.step_interval();
        Some(step)
    }

    /// Advance one square.
    pub fn step(&mut self) -> Step {
        let Some(head) = self.head() else {
            self.running = false;
            return Step::GameOver { score: self.score };
        };
        let (dr, dc) = match self.direction {
            Direction::Up    => (1, 0),
            Direction::Down  => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Left  => (0, -1),
        };
        let next = Square::checked(head.row as i32 + dr, head.column as i32 + dc)
            .filter(|s| !self.snake.contains(s));
        let Some(next) = next else {
            info!(score = self.score, "Game Over!");
            self.running = false;
            return Step::GameOver { score: self.score };
        };

        self.snake.push_back(next);
        let mut commands = vec![PadCommand::light(next, SNAKE_COLOR)];

        if let Some(i) = self.food.iter().position(|f| *f == next) {
            self.food.swap_remove(i);
            self.score += 1;
            commands.extend(self.spawn_food());
        } else if let Some(tail) = self.snake.pop_front() {
            commands.push(PadCommand::off(tail));
        }
        Step::Moved(commands)
    }

    fn spawn_food(&mut self) -> Option<PadCommand> {
        let free: Vec<Square> = Square::all()
            .filter(|s| !self.snake.contains(s) && !self.food.contains(s))
            .collect();
        let spot = *free.choose(&mut self.rng)?;
        self.food.push(spot);
        Some(PadCommand::light(spot, FOOD_COLOR))
    }
}

pub fn game_over_text(score: u32) -> PadCommand {
    PadCommand::text(format!("Game Over! Score: {}", score), Color::RED)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> SnakeGame {
        let mut g = SnakeGame::with_seed(7);
        g.start(Instant::now());
        g
    }

    fn press(square: Square) -> PadEvent {
        PadEvent::Pressed(Pad::Square(square))
    }

    #[test]
    fn start_draws_snake_food_and_abort_button() {
        let mut g = SnakeGame::with_seed(1);
        let commands = g.start(Instant::now());
        assert_eq!(commands[0], PadCommand::Reset);
        assert!(commands.contains(&PadCommand::light(Button::User2, Color::YELLOW)));
        assert!(commands.contains(&PadCommand::light(START, SNAKE_COLOR)));
        assert_eq!(g.food().len(), 1);
        assert_ne!(g.food()[0], START);
        assert!(commands.contains(&PadCommand::light(g.food()[0], FOOD_COLOR)));
        assert!(g.is_running());
        assert_eq!(g.direction(), Direction::Up);
    }

    #[test]
    fn moves_up_and_dies_at_the_top() {
        let mut g = started();
        g.food = vec![Square::new(0, 0)];

        for row in 1..8 {
            match g.step() {
                Step::Moved(commands) => {
                    assert_eq!(commands[0], PadCommand::light(Square::new(row, 3), SNAKE_COLOR));
                    assert_eq!(commands[1], PadCommand::off(Square::new(row - 1, 3)));
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(g.step(), Step::GameOver { score: 0 });
        assert!(!g.is_running());
    }

    #[test]
    fn eating_grows_and_speeds_up() {
        let mut g = started();
        g.food = vec![Square::new(1, 3)];
        assert_eq!(g.step_interval(), Duration::from_millis(500));

        let Step::Moved(commands) = g.step() else { panic!("game over") };
        assert_eq!(g.score(), 1);
        assert_eq!(g.snake().count(), 2);
        assert!(!commands.contains(&PadCommand::off(START)), "tail stays when eating");
        assert_eq!(g.food().len(), 1);
        assert!(!g.snake().any(|s| *s == g.food()[0]));
        assert_eq!(g.step_interval(), Duration::from_millis(550));
    }

    #[test]
    fn presses_turn_the_snake() {
        let mut g = started();
        g.on_pad_event(press(Square::new(5, 0)));
        assert_eq!(g.direction(), Direction::Left);

        g.on_pad_event(press(Square::new(0, 0)));
        assert_eq!(g.direction(), Direction::Up, "same row counts as up");

        g.on_pad_event(press(Square::new(0, 7)));
        assert_eq!(g.direction(), Direction::Right);

        g.food = vec![];
        g.step();
        g.on_pad_event(press(Square::new(0, 0)));
        assert_eq!(g.direction(), Direction::Up);
        g.on_pad_event(press(Square::new(7, 0)));
        assert_eq!(g.direction(), Direction::Left);

        // releases do nothing
        g.on_pad_event(PadEvent::Released(Pad::Square(Square::new(0, 7))));
        assert_eq!(g.direction(), Direction::Left);
    }

    #[test]
    fn running_into_itself_ends_the_game() {
        let mut g = started();
        g.snake = [Square::new(2, 3), Square::new(2, 2), Square::new(1, 2), Square::new(1, 3)]
            .into_iter()
            .collect();
        g.food = vec![];
        g.direction = Direction::Up;
        assert_eq!(g.step(), Step::GameOver { score: 0 });
    }

    #[test]
    fn user_2_aborts() {
        let mut g = started();
        assert!(!g.on_pad_event(PadEvent::Pressed(Pad::Button(Button::Mixer))));
        assert!(g.on_pad_event(PadEvent::Pressed(Pad::Button(Button::User2))));
        assert!(!g.is_running());
        assert!(g.tick(Instant::now() + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn tick_waits_for_the_interval() {
        let mut g = SnakeGame::with_seed(3);
        let t0 = Instant::now();
        g.start(t0);
        g.food = vec![Square::new(0, 0)];
        assert!(g.tick(t0 + Duration::from_millis(100)).is_none());
        assert!(matches!(g.tick(t0 + Duration::from_millis(500)), Some(Step::Moved(_))));
        assert!(g.tick(t0 + Duration::from_millis(700)).is_none());
    }

    #[test]
    fn game_over_text_is_red() {
        assert_eq!(game_over_text(4), PadCommand::text("Game Over! Score: 4", Color::RED));
    }
}
