use crate::api::{ApiClient, ApiError, Comment, Post};
use crate::query::{Query, QueryError};
use crate::theme::ThemeWatch;
use crate::ui::components::Spinner;
use crate::ui::ensure_min_size;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use std::time::Duration;
use tracing::debug;

/// A single post with its comments
pub struct PostDetailView {
  theme: ThemeWatch,
  post: Post,
  comments: Query<u64, Vec<Comment>, ApiError>,
  scroll: u16,
  spinner: Spinner,
}

impl PostDetailView {
  pub fn new(api: ApiClient, theme: ThemeWatch, post: Post, cache_duration: Duration) -> Self {
    let comments = Query::new(move |post_id: u64| {
      let api = api.clone();
      async move { api.get_comments_for_post(post_id).await }
    })
    .with_cache_key(format!("comments-{}", post.id))
    .with_cache_duration(cache_duration)
    .with_immediate(false);

    let mut view = Self {
      theme,
      post,
      comments,
      scroll: 0,
      spinner: Spinner::new(),
    };
    view.load(false);
    view
  }

  fn load(&mut self, refresh: bool) {
    let post_id = self.post.id;
    let request = if refresh {
      tokio::spawn(self.comments.refresh(post_id))
    } else {
      tokio::spawn(self.comments.execute(post_id))
    };
    // Failures are published through the query state
    tokio::spawn(async move {
      if let Ok(Err(QueryError::Failed(e))) = request.await {
        debug!(post_id, error = %e, "comments failed to load");
      }
    });
  }
}

impl View for PostDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
      KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
      KeyCode::Char('r') => self.load(true),
      KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
    ensure_min_size(area, 40, 10)?;
    let palette = self.theme.palette();

    let mut lines = vec![
      Line::styled(self.post.title.clone(), Style::default().fg(palette.accent).bold()),
      Line::styled(
        format!("Post #{} by user {}", self.post.id, self.post.user_id),
        Style::default().fg(palette.muted),
      ),
      Line::raw(""),
    ];
    lines.extend(
      self
        .post
        .body
        .lines()
        .map(|l| Line::styled(l.to_string(), Style::default().fg(palette.fg))),
    );
    lines.push(Line::raw(""));

    match (self.comments.error(), self.comments.data()) {
      (Some(error), _) => {
        lines.push(Line::styled(
          format!("Failed to load comments: {}", error),
          Style::default().fg(palette.error),
        ));
        lines.push(Line::styled("Press r to retry", Style::default().fg(palette.muted)));
      }
      (None, None) => lines.push(Line::styled(
        format!("{} Loading comments...", self.spinner.symbol()),
        Style::default().fg(palette.muted),
      )),
      (None, Some(comments)) => {
        lines.push(Line::styled(
          format!("Comments ({})", comments.len()),
          Style::default().fg(palette.warning).bold(),
        ));
        for comment in comments {
          lines.push(Line::raw(""));
          lines.push(Line::from(vec![
            Span::styled(comment.name.clone(), Style::default().fg(palette.fg).bold()),
            Span::styled(format!("  <{}>", comment.email), Style::default().fg(palette.muted)),
          ]));
          lines.extend(
            comment
              .body
              .lines()
              .map(|l| Line::styled(format!("  {}", l), Style::default().fg(palette.fg))),
          );
        }
      }
    }

    let block = Block::default()
      .title(format!(" Post #{} ", self.post.id))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(palette.border));

    frame.render_widget(
      Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((self.scroll, 0)),
      area,
    );
    Ok(())
  }

  fn breadcrumb_label(&self) -> String {
    format!("Post #{}", self.post.id)
  }

  fn tick(&mut self) {
    self.spinner.tick();
    self.comments.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("j/k", "scroll").with_priority(10),
      ShortcutInfo::new("r", "refresh").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ApiConfig;
  use crate::storage::LocalStorage;
  use crate::theme::{Theme, ThemeStore};
  use serde_json::json;
  use std::sync::Arc;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[tokio::test]
  async fn test_loads_comments_for_post() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/comments"))
      .and(query_param("postId", "3"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        {"postId": 3, "id": 11, "name": "nice", "email": "a@b.c", "body": "agreed"}
      ])))
      .mount(&server)
      .await;

    let api = ApiClient::new(&ApiConfig {
      base_url: server.uri(),
      timeout_ms: 2_000,
    })
    .unwrap();
    let storage = Arc::new(LocalStorage::open_in_memory().unwrap());
    let theme = ThemeStore::load(storage, Some(Theme::Light)).subscribe();
    let post = Post {
      user_id: 1,
      id: 3,
      title: "ea molestias".to_string(),
      body: "et iusto sed".to_string(),
    };

    let mut view = PostDetailView::new(api, theme, post, Duration::from_secs(60));
    for _ in 0..200 {
      view.tick();
      if view.comments.is_success() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(view.comments.data().map(|c| c.len()), Some(1));
    assert_eq!(view.breadcrumb_label(), "Post #3");
  }
}
