//! The list-and-create screen shared by every QMS page.
//!
//! A page loads its rows when mounted, renders them (or an empty state), and
//! creates new rows through a modal form. After a successful create it reloads
//! the list exactly once. Failures become notices; nothing escapes the page.

pub mod handlers;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::records::{
    create_record, AuditFields, Creatable, Direction, FormData, ListQuery, Repository,
};
use crate::core::session::CurrentUser;
use crate::core::ui::components::{
    render_dialog, render_empty_state, render_notices, render_spinner, Notice,
};
use crate::core::ui::layout::{render_layout, render_page_header};

/// Fixed wording and behaviour of one page.
#[derive(Debug, Clone, Copy)]
pub struct PageMeta {
    pub path: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub new_label: &'static str,
    pub dialog_title: &'static str,
    pub dialog_description: &'static str,
    /// Card around the list; pages without one render the list bare.
    pub list_heading: Option<ListHeading>,
    pub empty_icon: &'static str,
    pub empty_message: &'static str,
    pub load_error: &'static str,
    pub created_message: &'static str,
    /// Rows are listed most recent first on this column.
    pub order_by: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct ListHeading {
    pub title: &'static str,
    /// Receives the number of rows listed.
    pub summary: fn(usize) -> String,
}

pub trait PageEntity: Creatable {
    const PAGE: PageMeta;

    fn list_query() -> ListQuery {
        ListQuery::new().order_by(Self::PAGE.order_by, Direction::Descending)
    }

    /// Renders a non-empty list as a table or card grid.
    fn render_list(rows: &[Self]) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Open,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome<E> {
    /// The dialog was not open.
    Ignored,
    /// Required fields missing or unparsable; nothing was sent.
    Invalid,
    /// No signed-in user; nothing happens.
    NoSession,
    Created(E),
    Failed,
    /// The page was torn down while the insert was in flight.
    Discarded,
}

pub struct CrudPage<E, R>
where
    E: PageEntity,
    R: Repository<E> + ?Sized,
{
    repo: Arc<R>,
    rows: Vec<E>,
    load: LoadState,
    dialog: DialogState,
    draft: FormData,
    notices: Vec<Notice>,
    teardown: CancellationToken,
}

impl<E, R> CrudPage<E, R>
where
    E: PageEntity,
    R: Repository<E> + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            rows: Vec::new(),
            load: LoadState::Loading,
            dialog: DialogState::Closed,
            draft: FormData::new(),
            notices: Vec::new(),
            teardown: CancellationToken::new(),
        }
    }

    pub fn rows(&self) -> &[E] {
        &self.rows
    }

    pub fn load_state(&self) -> LoadState {
        self.load
    }

    pub fn dialog_state(&self) -> DialogState {
        self.dialog
    }

    pub fn draft(&self) -> &FormData {
        &self.draft
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Cancelling the handle tears the page down: results still in flight are
    /// dropped without touching state.
    pub fn teardown_handle(&self) -> CancellationToken {
        self.teardown.clone()
    }

    pub async fn mount(&mut self) {
        self.load = LoadState::Loading;
        self.refresh().await;
    }

    async fn refresh(&mut self) {
        let result = self.repo.list(&E::list_query()).await;
        if self.teardown.is_cancelled() {
            return;
        }
        match result {
            Ok(rows) => self.rows = rows,
            Err(e) => {
                log::warn!("Failed to list {}: {e}", E::TABLE);
                self.rows.clear();
                self.notices.push(Notice::error(E::PAGE.load_error));
            }
        }
        self.load = LoadState::Ready;
    }

    pub fn open_form(&mut self) {
        self.dialog = DialogState::Open;
        self.draft = FormData::new();
    }

    pub fn set_field(&mut self, name: &str, value: &str) {
        self.draft.set(name, value);
    }

    pub fn fill(&mut self, form: FormData) {
        self.draft = form;
    }

    pub fn cancel(&mut self) {
        self.dialog = DialogState::Closed;
        self.draft = FormData::new();
    }

    pub async fn submit(&mut self, user: Option<&CurrentUser>) -> SubmitOutcome<E> {
        if self.dialog != DialogState::Open {
            return SubmitOutcome::Ignored;
        }
        if let Err(e) = self.draft.check_required(E::FIELDS) {
            self.notices.push(Notice::error(e.to_string()));
            return SubmitOutcome::Invalid;
        }
        let Some(user) = user else {
            return SubmitOutcome::NoSession;
        };

        let result = create_record::<E, R>(&*self.repo, &self.draft, &AuditFields::now(user)).await;
        if self.teardown.is_cancelled() {
            return SubmitOutcome::Discarded;
        }
        match result {
            Ok(created) => {
                self.notices.push(Notice::success(E::PAGE.created_message));
                self.cancel();
                self.refresh().await;
                SubmitOutcome::Created(created)
            }
            Err(e) => {
                self.notices.push(Notice::error(e.to_string()));
                SubmitOutcome::Failed
            }
        }
    }

    /// Page body without the surrounding shell.
    pub fn render_content(&self) -> String {
        let meta = E::PAGE;
        let new_href = format!("{}?dialog=new", meta.path);
        let header = render_page_header(meta.title, meta.subtitle, Some((&new_href, meta.new_label)));

        let body = match self.load {
            LoadState::Loading => render_spinner(),
            LoadState::Ready if self.rows.is_empty() => {
                render_empty_state(meta.empty_icon, meta.empty_message)
            }
            LoadState::Ready => E::render_list(&self.rows),
        };

        let dialog = match self.dialog {
            DialogState::Open => render_dialog(
                meta.dialog_title,
                meta.dialog_description,
                meta.path,
                E::FIELDS,
                &self.draft,
            ),
            DialogState::Closed => String::new(),
        };

        let list = match meta.list_heading {
            Some(heading) => format!(
                r##"<section class="section">
                <h2 class="section-title">{}</h2>
                <p class="section-description">{}</p>
                {body}
            </section>"##,
                heading.title,
                (heading.summary)(self.rows.len())
            ),
            None => body,
        };

        format!(
            r##"{header}
            {list}
            {dialog}
            <div class="toasts">{}</div>"##,
            render_notices(&self.notices)
        )
    }

    pub fn render(&self, user_email: &str) -> String {
        render_layout(E::PAGE.title, E::PAGE.path, user_email, &self.render_content())
    }
}
