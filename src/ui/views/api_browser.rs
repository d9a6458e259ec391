use crate::api::{ApiClient, ApiError, Page, Photo, Post, User};
use crate::config::Config;
use crate::debounce::Debounced;
use crate::history::SearchHistory;
use crate::query::{Query, QueryError, QueryState};
use crate::storage::LocalStorage;
use crate::theme::ThemeWatch;
use crate::ui::components::{KeyResult, SearchEvent, SearchInput, Spinner};
use crate::ui::renderfns::truncate;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::PostDetailView;
use crate::ui::{ensure_min_size, ensure_valid_selection};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiTab {
  Posts,
  Users,
  Photos,
}

impl ApiTab {
  pub const ALL: [ApiTab; 3] = [ApiTab::Posts, ApiTab::Users, ApiTab::Photos];

  pub fn label(&self) -> &'static str {
    match self {
      ApiTab::Posts => "Posts",
      ApiTab::Users => "Users",
      ApiTab::Photos => "Photos",
    }
  }

  pub fn next(self) -> Self {
    match self {
      ApiTab::Posts => ApiTab::Users,
      ApiTab::Users => ApiTab::Photos,
      ApiTab::Photos => ApiTab::Posts,
    }
  }

  pub fn previous(self) -> Self {
    self.next().next()
  }

  pub fn index(&self) -> usize {
    match self {
      ApiTab::Posts => 0,
      ApiTab::Users => 1,
      ApiTab::Photos => 2,
    }
  }

  pub fn searchable(&self) -> bool {
    matches!(self, ApiTab::Posts | ApiTab::Users)
  }

  pub fn paginated(&self) -> bool {
    matches!(self, ApiTab::Posts | ApiTab::Photos)
  }
}

pub const USERS_KEY: &str = "users-all";

pub fn posts_key(page: u32, limit: u32) -> String {
  format!("posts-{}-{}", page, limit)
}

pub fn photos_key(page: u32, limit: u32) -> String {
  format!("photos-{}-{}", page, limit)
}

/// Posts whose title or body contains `query`, ignoring case
pub fn filter_posts<'a>(posts: &'a [Post], query: &str) -> Vec<&'a Post> {
  let query = query.trim().to_lowercase();
  posts
    .iter()
    .filter(|p| {
      query.is_empty()
        || p.title.to_lowercase().contains(&query)
        || p.body.to_lowercase().contains(&query)
    })
    .collect()
}

/// Users whose name, email or company name contains `query`, ignoring case
pub fn filter_users<'a>(users: &'a [User], query: &str) -> Vec<&'a User> {
  let query = query.trim().to_lowercase();
  users
    .iter()
    .filter(|u| {
      query.is_empty()
        || u.name.to_lowercase().contains(&query)
        || u.email.to_lowercase().contains(&query)
        || u.company.name.to_lowercase().contains(&query)
    })
    .collect()
}

fn total_pages<T>(page: &Page<T>) -> Option<u64> {
  let limit = u64::from(page.limit.max(1));
  page.total.map(|total| total.div_ceil(limit).max(1))
}

/// Spawn a query request, forwarding a failure to the footer.
fn spawn_request<T: Send + 'static>(
  notices: &mpsc::UnboundedSender<String>,
  what: &'static str,
  request: impl Future<Output = std::result::Result<T, QueryError<ApiError>>> + Send + 'static,
) {
  let notices = notices.clone();
  tokio::spawn(async move {
    match request.await {
      Ok(_) => {}
      Err(QueryError::Cancelled) => debug!(what, "request superseded"),
      Err(QueryError::Failed(e)) => {
        let _ = notices.send(format!("Failed to load {}: {}", what, e));
      }
    }
  });
}

fn run<A, T>(
  query: &mut Query<A, T, ApiError>,
  args: A,
  refresh: bool,
  notices: &mpsc::UnboundedSender<String>,
  what: &'static str,
) where
  A: Send + 'static,
  T: Clone + Send + 'static,
{
  if refresh {
    spawn_request(notices, what, query.refresh(args));
  } else {
    spawn_request(notices, what, query.execute(args));
  }
}

/// Browser for the JSONPlaceholder posts, users and photos collections
pub struct ApiBrowserView {
  api: ApiClient,
  theme: ThemeWatch,
  tab: ApiTab,
  cache_duration: Duration,

  posts: Query<(u32, u32), Page<Post>, ApiError>,
  photos: Query<(u32, u32), Page<Photo>, ApiError>,
  users: Query<(), Vec<User>, ApiError>,
  post_search: Query<String, Vec<Post>, ApiError>,
  user_search: Query<String, Vec<User>, ApiError>,

  search: SearchInput,
  debounced: Debounced<String>,
  /// Last search value that survived the debounce delay
  settled: String,
  history: SearchHistory,

  page: u32,
  page_size: u32,
  photos_page_size: u32,

  list_state: ListState,
  spinner: Spinner,
  notices_tx: mpsc::UnboundedSender<String>,
  notices_rx: mpsc::UnboundedReceiver<String>,
}

impl ApiBrowserView {
  pub fn new(
    api: ApiClient,
    storage: Arc<LocalStorage>,
    theme: ThemeWatch,
    config: &Config,
  ) -> Self {
    let cache_duration = config.fetch.cache_duration();

    let client = api.clone();
    let posts = Query::new(move |(page, limit): (u32, u32)| {
      let api = client.clone();
      async move { api.get_posts_page(page, limit).await }
    })
    .with_cache_duration(cache_duration)
    .with_immediate(false);

    let client = api.clone();
    let photos = Query::new(move |(page, limit): (u32, u32)| {
      let api = client.clone();
      async move { api.get_photos_page(page, limit).await }
    })
    .with_cache_duration(cache_duration)
    .with_immediate(false);

    let client = api.clone();
    let mut users = Query::new(move |()| {
      let api = client.clone();
      async move { api.get_users().await }
    })
    .with_cache_key(USERS_KEY)
    .with_cache_duration(cache_duration);
    users.mount();

    let client = api.clone();
    let post_search = Query::new(move |q: String| {
      let api = client.clone();
      async move { api.search_posts(&q).await }
    })
    .with_cache_duration(cache_duration)
    .with_immediate(false);

    let client = api.clone();
    let user_search = Query::new(move |q: String| {
      let api = client.clone();
      async move { api.search_users(&q).await }
    })
    .with_cache_duration(cache_duration)
    .with_immediate(false);

    let (notices_tx, notices_rx) = mpsc::unbounded_channel();

    let mut view = Self {
      api,
      theme,
      tab: ApiTab::Posts,
      cache_duration,
      posts,
      photos,
      users,
      post_search,
      user_search,
      search: SearchInput::new(),
      debounced: Debounced::new(String::new(), config.fetch.debounce()),
      settled: String::new(),
      history: SearchHistory::load(storage),
      page: 1,
      page_size: config.pagination.page_size.max(1),
      photos_page_size: config.pagination.photos_page_size.max(1),
      list_state: ListState::default(),
      spinner: Spinner::new(),
      notices_tx,
      notices_rx,
    };
    view.load(false);
    view
  }

  pub fn tab(&self) -> ApiTab {
    self.tab
  }

  fn searching(&self) -> bool {
    self.tab.searchable() && !self.settled.is_empty()
  }

  /// Issue the request backing the current tab, page and search.
  fn load(&mut self, refresh: bool) {
    let notices = &self.notices_tx;
    match self.tab {
      ApiTab::Posts if !self.settled.is_empty() => {
        let q = self.settled.clone();
        self
          .post_search
          .set_cache_key(Some(format!("posts-search-{}", q.to_lowercase())));
        run(&mut self.post_search, q, refresh, notices, "posts");
      }
      ApiTab::Posts => {
        self
          .posts
          .set_cache_key(Some(posts_key(self.page, self.page_size)));
        run(
          &mut self.posts,
          (self.page, self.page_size),
          refresh,
          notices,
          "posts",
        );
      }
      ApiTab::Users if !self.settled.is_empty() => {
        let q = self.settled.clone();
        self
          .user_search
          .set_cache_key(Some(format!("users-search-{}", q.to_lowercase())));
        run(&mut self.user_search, q, refresh, notices, "users");
      }
      ApiTab::Users => run(&mut self.users, (), refresh, notices, "users"),
      ApiTab::Photos => {
        self
          .photos
          .set_cache_key(Some(photos_key(self.page, self.photos_page_size)));
        run(
          &mut self.photos,
          (self.page, self.photos_page_size),
          refresh,
          notices,
          "photos",
        );
      }
    }
  }

  fn switch_tab(&mut self, tab: ApiTab) {
    if tab == self.tab {
      return;
    }
    self.tab = tab;
    self.search.clear();
    self.debounced.set_now(String::new());
    self.settled.clear();
    self.page = 1;
    self.list_state.select(Some(0));
    self.load(false);
  }

  fn has_next_page(&self) -> bool {
    match self.tab {
      ApiTab::Posts => self
        .posts
        .data()
        .is_some_and(|p| p.page == self.page && p.has_next()),
      ApiTab::Photos => self
        .photos
        .data()
        .is_some_and(|p| p.page == self.page && p.has_next()),
      ApiTab::Users => false,
    }
  }

  fn change_page(&mut self, forward: bool) -> ViewAction {
    if !self.tab.paginated() || self.searching() {
      return ViewAction::None;
    }
    // Data still belongs to the previous page until the request lands
    let loading = match self.tab {
      ApiTab::Posts => self.posts.is_loading(),
      ApiTab::Photos => self.photos.is_loading(),
      ApiTab::Users => false,
    };
    if loading {
      return ViewAction::None;
    }
    if forward {
      if !self.has_next_page() {
        return ViewAction::Notify("Already on the last page".to_string());
      }
      self.page += 1;
    } else {
      if self.page <= 1 {
        return ViewAction::Notify("Already on the first page".to_string());
      }
      self.page -= 1;
    }
    self.list_state.select(Some(0));
    self.load(false);
    ViewAction::None
  }

  fn visible_posts(&self) -> Vec<&Post> {
    if self.searching() {
      self
        .post_search
        .data()
        .map(|posts| filter_posts(posts, &self.settled))
        .unwrap_or_default()
    } else {
      self
        .posts
        .data()
        .map(|page| page.items.iter().collect())
        .unwrap_or_default()
    }
  }

  fn visible_users(&self) -> Vec<&User> {
    let (users, query) = if self.searching() {
      (self.user_search.data(), self.settled.as_str())
    } else {
      (self.users.data(), "")
    };
    users.map(|u| filter_users(u, query)).unwrap_or_default()
  }

  fn visible_len(&self) -> usize {
    match self.tab {
      ApiTab::Posts => self.visible_posts().len(),
      ApiTab::Users => self.visible_users().len(),
      ApiTab::Photos => self.photos.data().map(|p| p.items.len()).unwrap_or(0),
    }
  }

  fn selected_post(&self) -> Option<Post> {
    let index = self.list_state.selected()?;
    self.visible_posts().get(index).map(|p| (*p).clone())
  }

  fn block(&self, title: String) -> Block<'static> {
    let palette = self.theme.palette();
    Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(palette.border))
  }

  /// Title for the content block, with a spinner while a request is running
  fn content_title<T>(&self, label: &str, state: &QueryState<T>) -> String {
    if state.is_loading() {
      format!(" {} {} ", label, self.spinner.symbol())
    } else {
      format!(" {} ", label)
    }
  }

  /// Draw the loading or error panel for `state`. Returns `false` when there
  /// is data to show instead.
  fn render_placeholder<T>(
    &self,
    frame: &mut Frame,
    area: Rect,
    what: &str,
    state: &QueryState<T>,
  ) -> bool {
    let palette = self.theme.palette();

    if let Some(error) = state.error() {
      let text = vec![
        Line::styled(format!("Failed to load {}", what), Style::default().fg(palette.error).bold()),
        Line::raw(""),
        Line::styled(error.to_string(), Style::default().fg(palette.error)),
        Line::raw(""),
        Line::from(vec![
          Span::raw("Press "),
          Span::styled("r", Style::default().fg(palette.accent).bold()),
          Span::raw(" to retry"),
        ]),
      ];
      let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.error));
      frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
      );
      return true;
    }

    if state.data().is_none() {
      let text = format!("{} Loading {}...", self.spinner.symbol(), what);
      frame.render_widget(
        Paragraph::new(text)
          .block(self.block(format!(" {} ", what)))
          .style(Style::default().fg(palette.muted)),
        area,
      );
      return true;
    }

    false
  }

  fn render_empty(&self, frame: &mut Frame, area: Rect, title: String, what: &str) {
    let palette = self.theme.palette();
    let text = if self.searching() {
      format!("No {} match \"{}\".", what, self.settled)
    } else {
      format!("No {} found.", what)
    };
    frame.render_widget(
      Paragraph::new(text)
        .block(self.block(title))
        .style(Style::default().fg(palette.muted)),
      area,
    );
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect, title: String, items: Vec<ListItem<'static>>) {
    let palette = self.theme.palette();
    ensure_valid_selection(&mut self.list_state, items.len());
    let list = List::new(items)
      .block(self.block(title))
      .highlight_style(
        Style::default()
          .bg(palette.highlight)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_posts(&mut self, frame: &mut Frame, area: Rect) {
    let palette = self.theme.palette();
    let (state_is_placeholder, title) = if self.searching() {
      let title = self.content_title(
        &format!("Posts matching \"{}\"", self.settled),
        self.post_search.state(),
      );
      (
        self.render_placeholder(frame, area, "posts", self.post_search.state()),
        title,
      )
    } else {
      let title = self.content_title("Posts", self.posts.state());
      (
        self.render_placeholder(frame, area, "posts", self.posts.state()),
        title,
      )
    };
    if state_is_placeholder {
      return;
    }

    let width = (area.width as usize).saturating_sub(14).max(10);
    let items: Vec<ListItem<'static>> = self
      .visible_posts()
      .iter()
      .map(|post| {
        ListItem::new(vec![
          Line::from(vec![
            Span::styled(format!("#{:<4}", post.id), Style::default().fg(palette.accent)),
            Span::styled(truncate(&post.title, width), Style::default().fg(palette.fg).bold()),
          ]),
          Line::styled(
            format!("      {}", truncate(&post.body.replace('\n', " "), width)),
            Style::default().fg(palette.muted),
          ),
        ])
      })
      .collect();

    if items.is_empty() {
      self.render_empty(frame, area, title, "posts");
      return;
    }
    self.render_list(frame, area, title, items);
  }

  fn render_users(&mut self, frame: &mut Frame, area: Rect) {
    let palette = self.theme.palette();
    let (state_is_placeholder, title) = if self.searching() {
      let title = self.content_title(
        &format!("Users matching \"{}\"", self.settled),
        self.user_search.state(),
      );
      (
        self.render_placeholder(frame, area, "users", self.user_search.state()),
        title,
      )
    } else {
      let title = self.content_title("Users", self.users.state());
      (
        self.render_placeholder(frame, area, "users", self.users.state()),
        title,
      )
    };
    if state_is_placeholder {
      return;
    }

    let users: Vec<User> = self.visible_users().into_iter().cloned().collect();
    if users.is_empty() {
      self.render_empty(frame, area, title, "users");
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
      .split(area);

    let items: Vec<ListItem<'static>> = users
      .iter()
      .map(|user| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<24}", truncate(&user.name, 24)), Style::default().fg(palette.fg)),
          Span::styled(user.email.clone(), Style::default().fg(palette.muted)),
        ]))
      })
      .collect();
    self.render_list(frame, chunks[0], title, items);

    if let Some(user) = self.list_state.selected().and_then(|i| users.get(i)) {
      let field = |label: &'static str, value: String| {
        Line::from(vec![
          Span::styled(format!("{:<10}", label), Style::default().fg(palette.muted)),
          Span::styled(value, Style::default().fg(palette.fg)),
        ])
      };
      let address = &user.address;
      let lines = vec![
        Line::styled(user.name.clone(), Style::default().fg(palette.accent).bold()),
        Line::raw(""),
        field("Username", user.username.clone()),
        field("Email", user.email.clone()),
        field("Phone", user.phone.clone()),
        field("Website", user.website.clone()),
        field(
          "Address",
          format!("{} {}, {} {}", address.street, address.suite, address.city, address.zipcode),
        ),
        Line::raw(""),
        field("Company", user.company.name.clone()),
        Line::styled(
          format!("\"{}\"", user.company.catch_phrase),
          Style::default().fg(palette.muted).italic(),
        ),
      ];
      frame.render_widget(
        Paragraph::new(lines)
          .block(self.block(" Details ".to_string()))
          .wrap(Wrap { trim: true }),
        chunks[1],
      );
    }
  }

  fn render_photos(&mut self, frame: &mut Frame, area: Rect) {
    let palette = self.theme.palette();
    let title = self.content_title("Photos", self.photos.state());
    if self.render_placeholder(frame, area, "photos", self.photos.state()) {
      return;
    }

    let width = (area.width as usize).saturating_sub(24).max(10);
    let items: Vec<ListItem<'static>> = self
      .photos
      .data()
      .map(|page| {
        page
          .items
          .iter()
          .map(|photo| {
            ListItem::new(vec![
              Line::from(vec![
                Span::styled(format!("#{:<5}", photo.id), Style::default().fg(palette.accent)),
                Span::styled(
                  format!("album {:<4} ", photo.album_id),
                  Style::default().fg(palette.muted),
                ),
                Span::styled(truncate(&photo.title, width), Style::default().fg(palette.fg)),
              ]),
              Line::styled(
                format!("      {}", photo.thumbnail_url),
                Style::default().fg(palette.muted),
              ),
            ])
          })
          .collect()
      })
      .unwrap_or_default();

    if items.is_empty() {
      self.render_empty(frame, area, title, "photos");
      return;
    }
    self.render_list(frame, area, title, items);
  }

  fn render_tabs(&self, frame: &mut Frame, area: Rect) {
    let palette = self.theme.palette();
    let titles: Vec<String> = ApiTab::ALL.iter().map(|t| format!(" {} ", t.label())).collect();
    let tabs = Tabs::new(titles)
      .select(self.tab.index())
      .block(
        Block::default()
          .borders(Borders::ALL)
          .border_style(Style::default().fg(palette.border))
          .title(" JSONPlaceholder "),
      )
      .style(Style::default().fg(palette.muted))
      .highlight_style(Style::default().fg(palette.accent).bold());
    frame.render_widget(tabs, area);
  }

  fn render_status_line(&self, frame: &mut Frame, area: Rect) {
    let palette = self.theme.palette();
    let muted = Style::default().fg(palette.muted);
    let mut spans = Vec::new();

    if self.search.is_active() && !self.history.entries().is_empty() {
      spans.push(Span::styled(" Recent: ", muted));
      spans.push(Span::styled(
        self.history.entries().join(" · "),
        Style::default().fg(palette.fg),
      ));
    } else if self.searching() {
      spans.push(Span::styled(" Search: ", muted));
      spans.push(Span::styled(
        format!("\"{}\"", self.settled),
        Style::default().fg(palette.warning),
      ));
      spans.push(Span::styled("  (Esc to clear)", muted));
    } else if self.tab.paginated() {
      let page_info = match self.tab {
        ApiTab::Posts => self.posts.data().and_then(total_pages),
        _ => self.photos.data().and_then(total_pages),
      };
      let text = match page_info {
        Some(total) => format!(" Page {} of {}", self.page, total),
        None => format!(" Page {}", self.page),
      };
      spans.push(Span::styled(text, Style::default().fg(palette.fg)));
      spans.push(Span::styled("  n next · p previous", muted));
    } else if self.tab.searchable() {
      spans.push(Span::styled(" / to search", muted));
    }

    if self.debounced.is_pending() {
      spans.push(Span::styled("  typing…", muted));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }
}

impl View for ApiBrowserView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if !self.tab.searchable() && key.code == KeyCode::Char('/') && !self.search.is_active() {
      return ViewAction::Notify("Search is available on Posts and Users".to_string());
    }

    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(query)) => {
        self.debounced.set(query.trim().to_string());
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted(query)) => {
        self.history.record(&query);
        self.debounced.set_now(query);
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('g') | KeyCode::Home => self.list_state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.list_state.select_last(),
      KeyCode::Tab => self.switch_tab(self.tab.next()),
      KeyCode::BackTab => self.switch_tab(self.tab.previous()),
      KeyCode::Char('1') => self.switch_tab(ApiTab::Posts),
      KeyCode::Char('2') => self.switch_tab(ApiTab::Users),
      KeyCode::Char('3') => self.switch_tab(ApiTab::Photos),
      KeyCode::Char('n') | KeyCode::Right => return self.change_page(true),
      KeyCode::Char('p') | KeyCode::Left => return self.change_page(false),
      KeyCode::Char('r') => self.load(true),
      KeyCode::Char('H') => {
        self.history.clear();
        return ViewAction::Notify("Search history cleared".to_string());
      }
      KeyCode::Enter if self.tab == ApiTab::Posts => {
        if let Some(post) = self.selected_post() {
          return ViewAction::Push(Box::new(PostDetailView::new(
            self.api.clone(),
            self.theme.clone(),
            post,
            self.cache_duration,
          )));
        }
      }
      KeyCode::Esc if self.searching() || !self.search.query().is_empty() => {
        self.search.clear();
        self.debounced.set_now(String::new());
      }
      KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
    ensure_min_size(area, 50, 10)?;

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(3), // Tabs
        Constraint::Length(1), // Page / search info
        Constraint::Min(4),    // Content
      ])
      .split(area);

    self.render_tabs(frame, chunks[0]);
    self.render_status_line(frame, chunks[1]);
    match self.tab {
      ApiTab::Posts => self.render_posts(frame, chunks[2]),
      ApiTab::Users => self.render_users(frame, chunks[2]),
      ApiTab::Photos => self.render_photos(frame, chunks[2]),
    }

    self
      .search
      .render_overlay(frame, chunks[2], &self.theme.palette());
    Ok(())
  }

  fn breadcrumb_label(&self) -> String {
    format!("API [{}]", self.tab.label())
  }

  fn captures_input(&self) -> bool {
    self.search.is_active()
  }

  fn tick(&mut self) {
    self.spinner.tick();
    self.posts.poll();
    self.photos.poll();
    self.users.poll();
    self.post_search.poll();
    self.user_search.poll();

    if self.debounced.poll() {
      let value = self.debounced.value().trim().to_string();
      if value != self.settled && (self.tab.searchable() || value.is_empty()) {
        debug!(query = %value, "search settled");
        self.settled = value;
        self.list_state.select(Some(0));
        self.load(false);
      }
    }

    let len = self.visible_len();
    ensure_valid_selection(&mut self.list_state, len);
  }

  fn take_notification(&mut self) -> Option<String> {
    self.notices_rx.try_recv().ok()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("tab", "switch").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(30),
      ShortcutInfo::new("t", "theme").with_priority(80),
    ];
    if self.tab.searchable() {
      shortcuts.push(ShortcutInfo::new("/", "search").with_priority(40));
    }
    if self.tab.paginated() && !self.searching() {
      shortcuts.push(ShortcutInfo::new("n/p", "page").with_priority(50));
    }
    if self.tab == ApiTab::Posts {
      shortcuts.push(ShortcutInfo::new("enter", "comments").with_priority(60));
    }
    shortcuts
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{Address, Company};
  use crate::config::ApiConfig;
  use crate::theme::{Theme, ThemeStore};
  use crossterm::event::KeyModifiers;
  use serde_json::json;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn post(id: u64, title: &str, body: &str) -> Post {
    Post {
      user_id: 1,
      id,
      title: title.to_string(),
      body: body.to_string(),
    }
  }

  fn user(id: u64, name: &str, email: &str, company: &str) -> User {
    User {
      id,
      name: name.to_string(),
      username: String::new(),
      email: email.to_string(),
      phone: String::new(),
      website: String::new(),
      address: Address::default(),
      company: Company {
        name: company.to_string(),
        ..Company::default()
      },
    }
  }

  #[test]
  fn test_filter_posts_matches_title_and_body() {
    let posts = vec![
      post(1, "Sunt aut facere", "quia et suscipit"),
      post(2, "qui est esse", "est rerum tempore"),
    ];
    assert_eq!(filter_posts(&posts, "FACERE").len(), 1);
    assert_eq!(filter_posts(&posts, "rerum")[0].id, 2);
    assert_eq!(filter_posts(&posts, "  ").len(), 2);
    assert!(filter_posts(&posts, "nothing").is_empty());
  }

  #[test]
  fn test_filter_users_matches_name_email_company() {
    let users = vec![
      user(1, "Leanne Graham", "Sincere@april.biz", "Romaguera-Crona"),
      user(2, "Ervin Howell", "Shanna@melissa.tv", "Deckow-Crist"),
    ];
    assert_eq!(filter_users(&users, "leanne")[0].id, 1);
    assert_eq!(filter_users(&users, "melissa")[0].id, 2);
    assert_eq!(filter_users(&users, "crist")[0].id, 2);
    assert_eq!(filter_users(&users, "").len(), 2);
  }

  #[test]
  fn test_cache_keys_and_tabs() {
    assert_eq!(posts_key(2, 10), "posts-2-10");
    assert_eq!(photos_key(1, 12), "photos-1-12");
    assert_eq!(ApiTab::Photos.next(), ApiTab::Posts);
    assert_eq!(ApiTab::Posts.previous(), ApiTab::Photos);
    assert!(!ApiTab::Photos.searchable());
    assert!(!ApiTab::Users.paginated());
  }

  #[test]
  fn test_total_pages_rounds_up() {
    let page = Page {
      items: vec![0u8; 12],
      page: 1,
      limit: 12,
      total: Some(5000),
    };
    assert_eq!(total_pages(&page), Some(417));
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn posts_json(ids: std::ops::RangeInclusive<u64>) -> serde_json::Value {
    json!(ids
      .map(|id| json!({"userId": 1, "id": id, "title": format!("post {}", id), "body": "body"}))
      .collect::<Vec<_>>())
  }

  async fn server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/users"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        {"id": 1, "name": "Ann", "email": "ann@example.com"},
        {"id": 2, "name": "Bob", "email": "bob@example.com"}
      ])))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/posts"))
      .and(query_param("_page", "1"))
      .respond_with(
        ResponseTemplate::new(200)
          .insert_header("x-total-count", "20")
          .set_body_json(posts_json(1..=10)),
      )
      .mount(&server)
      .await;
    server
  }

  fn view_for(server: &MockServer) -> ApiBrowserView {
    let config = Config {
      api: ApiConfig {
        base_url: server.uri(),
        timeout_ms: 2_000,
      },
      ..Config::default()
    };
    let storage = Arc::new(LocalStorage::open_in_memory().unwrap());
    let theme = ThemeStore::load(storage.clone(), Some(Theme::Dark)).subscribe();
    let api = ApiClient::new(&config.api).unwrap();
    ApiBrowserView::new(api, storage, theme, &config)
  }

  /// Tick the view until `done` holds or two seconds pass
  async fn tick_until(view: &mut ApiBrowserView, done: impl Fn(&ApiBrowserView) -> bool) {
    for _ in 0..200 {
      view.tick();
      if done(view) {
        return;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
  }

  #[tokio::test]
  async fn test_loads_first_page_and_users_on_open() {
    let server = server().await;
    let mut view = view_for(&server);

    tick_until(&mut view, |v| v.posts.is_success() && v.users.is_success()).await;
    assert_eq!(view.visible_posts().len(), 10);
    assert_eq!(view.posts.cache_key().as_deref(), Some("posts-1-10"));
    assert!(view.has_next_page());
  }

  #[tokio::test]
  async fn test_next_page_requests_page_two() {
    let server = server().await;
    Mock::given(method("GET"))
      .and(path("/posts"))
      .and(query_param("_page", "2"))
      .respond_with(
        ResponseTemplate::new(200)
          .insert_header("x-total-count", "20")
          .set_body_json(posts_json(11..=20)),
      )
      .expect(1)
      .mount(&server)
      .await;

    let mut view = view_for(&server);
    tick_until(&mut view, |v| v.posts.is_success()).await;

    view.handle_key(key(KeyCode::Char('n')));
    assert_eq!(view.page, 2);
    tick_until(&mut view, |v| {
      v.posts.is_success() && v.posts.data().is_some_and(|p| p.page == 2)
    })
    .await;
    assert_eq!(view.visible_posts()[0].id, 11);
    assert!(!view.has_next_page());

    // Last page: n is refused
    assert!(matches!(
      view.handle_key(key(KeyCode::Char('n'))),
      ViewAction::Notify(_)
    ));
    assert_eq!(view.page, 2);
  }

  #[tokio::test]
  async fn test_repeated_next_while_loading_stays_on_last_page() {
    let server = server().await;
    Mock::given(method("GET"))
      .and(path("/posts"))
      .and(query_param("_page", "2"))
      .respond_with(
        ResponseTemplate::new(200)
          .insert_header("x-total-count", "20")
          .set_body_json(posts_json(11..=20))
          .set_delay(Duration::from_millis(300)),
      )
      .mount(&server)
      .await;

    let mut view = view_for(&server);
    tick_until(&mut view, |v| v.posts.is_success()).await;

    view.handle_key(key(KeyCode::Char('n')));
    view.handle_key(key(KeyCode::Char('n')));
    assert_eq!(view.page, 2);

    tick_until(&mut view, |v| {
      v.posts.is_success() && v.posts.data().is_some_and(|p| p.page == 2)
    })
    .await;
    assert_eq!(view.page, 2);
    assert_eq!(view.visible_posts().len(), 10);
  }

  #[tokio::test]
  async fn test_debounced_user_search_issues_one_request() {
    let server = server().await;
    Mock::given(method("GET"))
      .and(path("/users"))
      .and(query_param("name_like", "Ann"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        {"id": 1, "name": "Ann", "email": "ann@example.com"}
      ])))
      .with_priority(1)
      .expect(1)
      .mount(&server)
      .await;

    let mut view = view_for(&server);
    view.handle_key(key(KeyCode::Tab));
    assert_eq!(view.tab(), ApiTab::Users);

    view.handle_key(key(KeyCode::Char('/')));
    assert!(view.captures_input());
    for c in "Ann".chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
    // Nothing settles before the delay
    view.tick();
    assert!(view.settled.is_empty());

    tick_until(&mut view, |v| v.user_search.is_success()).await;
    assert_eq!(view.settled, "Ann");
    assert_eq!(view.visible_users().len(), 1);

    // Switching tabs drops the search
    view.handle_key(key(KeyCode::Enter));
    view.handle_key(key(KeyCode::Tab));
    assert_eq!(view.tab(), ApiTab::Photos);
    assert!(view.settled.is_empty());
    assert_eq!(view.search.query(), "");
  }

  #[tokio::test]
  async fn test_failed_request_shows_error_and_notifies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let mut view = view_for(&server);
    tick_until(&mut view, |v| v.posts.is_error()).await;
    assert_eq!(
      view.posts.error(),
      Some("HTTP error! status: 500 Internal Server Error")
    );

    let mut notice = None;
    for _ in 0..100 {
      notice = view.take_notification();
      if notice.is_some() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(notice.unwrap().starts_with("Failed to load posts"));
  }

  #[tokio::test]
  async fn test_photos_tab_rejects_search() {
    let server = server().await;
    let mut view = view_for(&server);
    view.handle_key(key(KeyCode::Char('3')));

    assert!(matches!(
      view.handle_key(key(KeyCode::Char('/'))),
      ViewAction::Notify(_)
    ));
    assert!(!view.captures_input());
  }
}
