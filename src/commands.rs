/// Palette commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "tasks",
    aliases: &["todo", "task"],
    description: "Manage your tasks",
  },
  Command {
    name: "api",
    aliases: &["data", "browse", "posts", "users", "photos"],
    description: "Browse the JSONPlaceholder API",
  },
  Command {
    name: "about",
    aliases: &["help", "?"],
    description: "About taskdeck",
  },
  Command {
    name: "theme",
    aliases: &["dark", "light", "toggle"],
    description: "Toggle light/dark theme",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit taskdeck",
  },
];

/// Resolve typed input to a command by exact name or alias.
pub fn find(input: &str) -> Option<&'static Command> {
  let input = input.trim().to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == input || cmd.aliases.contains(&input.as_str()))
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    if cmd.name == input_lower {
      matches.push((cmd, 0));
      continue;
    }

    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Stable sort keeps declaration order within a priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
