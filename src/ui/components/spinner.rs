const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Loading indicator advanced once per tick
#[derive(Debug, Clone, Copy, Default)]
pub struct Spinner {
  frame: usize,
}

impl Spinner {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn tick(&mut self) {
    self.frame = (self.frame + 1) % FRAMES.len();
  }

  pub fn symbol(&self) -> &'static str {
    FRAMES[self.frame]
  }
}
