//! Conversation thread view.
//!
//! Shows one status with its ancestor chain above and its reply tree
//! below, under the engine's single-visible-branch policy. Context is
//! fetched on the worker; until it lands the view renders a loading line.
//!
//! Key bindings: j/k navigate, enter/space expand or collapse replies,
//! x reveal a content warning, esc back to the timeline.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};

use flock_core::conversation::{ConversationTree, ThreadItem};
use flock_core::error::FetchError;
use flock_core::model::{AttributeStore, RevealState, Status, StatusId};

use crate::api::Context;

/// What the timeline loop should do after a key press in the thread view.
pub enum ThreadAction {
    Stay,
    Close,
}

pub struct ThreadView {
    focal_id: StatusId,
    focal: Option<Status>,
    tree: Option<ConversationTree>,
    attributes: AttributeStore,
    items: Vec<ThreadItem>,
    statuses: HashMap<StatusId, Status>,
    selected: usize,
    error: Option<String>,
}

impl ThreadView {
    /// Create the view in its loading state; context arrives later via
    /// [`ThreadView::apply_context`].
    pub fn new(focal_id: StatusId) -> Self {
        Self {
            focal_id,
            focal: None,
            tree: None,
            attributes: AttributeStore::new(),
            items: Vec::new(),
            statuses: HashMap::new(),
            selected: 0,
            error: None,
        }
    }

    pub const fn focal_id(&self) -> &StatusId {
        &self.focal_id
    }

    /// Apply a fetched context, rebuilding the tree. Expansion flags
    /// carry forward across refetches by identity.
    pub fn apply_context(&mut self, result: Result<Context, FetchError>) {
        match result {
            Ok(context) => {
                self.statuses.clear();
                self.statuses
                    .insert(context.focal.id.clone(), context.focal.clone());
                let mut batch = context.ancestors;
                batch.extend(context.descendants);
                for status in &batch {
                    self.statuses.insert(status.id.clone(), status.clone());
                }

                let tree = ConversationTree::build(&context.focal, &batch, self.tree.as_ref());
                self.items = tree.render(&mut self.attributes);
                self.tree = Some(tree);
                self.focal = Some(context.focal);
                self.error = None;
                self.clamp_selection();
            }
            Err(err) => self.error = Some(err.to_string()),
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> ThreadAction {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return ThreadAction::Close,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected + 1 < self.items.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('x') => self.reveal_selected(),
            _ => {}
        }
        ThreadAction::Stay
    }

    /// Expand or collapse the reply branch under the cursor.
    fn toggle_selected(&mut self) {
        let target = match self.items.get(self.selected) {
            Some(ThreadItem::Reply { id, .. }) => id.clone(),
            Some(ThreadItem::ShowReplies { parent }) => parent.clone(),
            _ => return,
        };
        if let Some(tree) = &mut self.tree {
            if tree.toggle_expansion(&target) {
                self.items = tree.render(&mut self.attributes);
                self.clamp_selection();
            }
        }
    }

    fn reveal_selected(&mut self) {
        let attribute = match self.items.get(self.selected) {
            Some(
                ThreadItem::Ancestor { attribute, .. }
                | ThreadItem::Focal { attribute, .. }
                | ThreadItem::Reply { attribute, .. },
            ) => attribute,
            _ => return,
        };
        let mut attr = attribute.borrow_mut();
        attr.reveal = attr.reveal.toggled();
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let title = self
            .focal
            .as_ref()
            .map_or_else(|| "thread".to_string(), |s| format!("thread: {}", s.account));
        let block = Block::default().borders(Borders::ALL).title(title);

        if let Some(ref error) = self.error {
            let lines = vec![ListItem::new(Line::from(Span::styled(
                format!("context fetch failed: {error}"),
                Style::default().fg(Color::Red),
            )))];
            frame.render_widget(List::new(lines).block(block), area);
            return;
        }
        if self.items.is_empty() {
            let lines = vec![ListItem::new(Line::from("loading thread…"))];
            frame.render_widget(List::new(lines).block(block), area);
            return;
        }

        let rows: Vec<ListItem<'_>> = self.items.iter().map(|item| self.row(item)).collect();
        let mut state = ListState::default();
        state.select(Some(self.selected));
        let list = List::new(rows)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn row(&self, item: &ThreadItem) -> ListItem<'_> {
        match item {
            ThreadItem::Ancestor { id, attribute } => {
                self.status_row(id, "│ ", Style::default().fg(Color::DarkGray), attribute)
            }
            ThreadItem::Focal { id, attribute } => self.status_row(
                id,
                "▶ ",
                Style::default().add_modifier(Modifier::BOLD),
                attribute,
            ),
            ThreadItem::Reply { id, attribute } => {
                self.status_row(id, "  ↳ ", Style::default(), attribute)
            }
            ThreadItem::ShowReplies { .. } => ListItem::new(Line::from(Span::styled(
                "    … show replies",
                Style::default().fg(Color::Cyan),
            ))),
        }
    }

    fn status_row(
        &self,
        id: &StatusId,
        prefix: &str,
        style: Style,
        attribute: &flock_core::model::SharedAttribute,
    ) -> ListItem<'_> {
        let Some(status) = self.statuses.get(id) else {
            return ListItem::new(Line::from(format!("{prefix}<{id}>")));
        };
        let concealed =
            status.sensitive && attribute.borrow().reveal == RevealState::Concealed;
        let body = if concealed {
            format!("[CW: {}] (x to reveal)", status.spoiler_text)
        } else {
            status.content.replace('\n', " ")
        };
        ListItem::new(Line::from(vec![
            Span::styled(format!("{prefix}{}: ", status.account), style),
            Span::raw(body),
        ]))
    }
}
