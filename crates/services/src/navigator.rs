//! Item Navigator: derives item cards and the links to item pages.

use url::Url;

use testset_core::model::{ItemId, ItemKind, ItemMeta, ItemStatus, StoredSubmission, SubmissionId, TestSetDetail};

use crate::error::NavigationError;

const SUBMISSION_PARAM: &str = "submissionId";
const RETURN_PARAM: &str = "returnUrl";

/// Completion counts over the projected items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    #[must_use]
    pub fn from_items(items: &[ItemStatus]) -> Self {
        Self {
            completed: items.iter().filter(|item| item.completed).count(),
            total: items.len(),
        }
    }

    /// `completed / total * 100`, or 0 for an empty test set.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.completed as f64 / self.total as f64;
        ratio * 100.0
    }

    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Builds item page URLs under the app's own base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemNavigator {
    app_base: Url,
}

impl ItemNavigator {
    #[must_use]
    pub fn new(app_base: Url) -> Self {
        Self { app_base }
    }

    #[must_use]
    pub fn app_base(&self) -> &Url {
        &self.app_base
    }

    /// Catalog items crossed with the stored completion lists: quizzes
    /// first, then problems, each in catalog order.
    #[must_use]
    pub fn project_items(detail: &TestSetDetail, stored: &StoredSubmission) -> Vec<ItemStatus> {
        let quizzes = detail.quizzes.iter().map(|quiz| ItemStatus {
            id: quiz.id.clone(),
            kind: ItemKind::Quiz,
            title: quiz.title.clone(),
            completed: stored.is_completed(ItemKind::Quiz, &quiz.id),
            meta: ItemMeta::Quiz {
                question_count: quiz.question_count,
                duration: quiz.duration,
            },
        });
        let problems = detail.problems.iter().map(|problem| ItemStatus {
            id: problem.id.clone(),
            kind: ItemKind::Code,
            title: problem.title.clone(),
            completed: stored.is_completed(ItemKind::Code, &problem.id),
            meta: ItemMeta::Code {
                difficulty: problem.difficulty,
            },
        });
        quizzes.chain(problems).collect()
    }

    /// Where a click on `item` leads. Completed items lead nowhere.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::CannotBeABase` if the app base cannot carry
    /// a path.
    pub fn target_for(
        &self,
        submission_id: &SubmissionId,
        item: &ItemStatus,
        return_url: &str,
    ) -> Result<Option<Url>, NavigationError> {
        if item.completed {
            return Ok(None);
        }
        let link = ItemLink {
            kind: item.kind,
            item_id: item.id.clone(),
            submission_id: submission_id.clone(),
            return_url: return_url.to_owned(),
        };
        link.to_url(&self.app_base).map(Some)
    }
}

/// Decoded item page address:
/// `/testset/{quiz|code}/{itemId}?submissionId=…&returnUrl=…`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLink {
    pub kind: ItemKind,
    pub item_id: ItemId,
    pub submission_id: SubmissionId,
    pub return_url: String,
}

impl ItemLink {
    /// # Errors
    ///
    /// Returns `NavigationError::CannotBeABase` if `base` cannot carry a path.
    pub fn to_url(&self, base: &Url) -> Result<Url, NavigationError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| NavigationError::CannotBeABase(base.to_string()))?
            .pop_if_empty()
            .extend(["testset", self.kind.path_segment(), self.item_id.as_str()]);
        url.query_pairs_mut()
            .clear()
            .append_pair(SUBMISSION_PARAM, self.submission_id.as_str())
            .append_pair(RETURN_PARAM, &self.return_url);
        url.set_fragment(None);
        Ok(url)
    }

    /// Path plus query, the form the in-app router navigates with.
    ///
    /// # Errors
    ///
    /// See [`ItemLink::to_url`].
    pub fn to_route(&self, base: &Url) -> Result<String, NavigationError> {
        let url = self.to_url(base)?;
        Ok(match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_owned(),
        })
    }

    /// # Errors
    ///
    /// Returns `NavigationError` if the url is not an item page or a query
    /// parameter is missing.
    pub fn parse(url: &Url) -> Result<Self, NavigationError> {
        let not_item = || NavigationError::NotAnItemPage(url.to_string());
        let segments: Vec<&str> = url
            .path_segments()
            .ok_or_else(not_item)?
            .filter(|segment| !segment.is_empty())
            .collect();
        let [.., "testset", kind, item_id] = segments.as_slice() else {
            return Err(not_item());
        };
        let kind = ItemKind::from_path_segment(kind).ok_or_else(not_item)?;
        let item_id: ItemId = percent_decode(item_id).parse().map_err(|_| not_item())?;

        let mut submission_id = None;
        let mut return_url = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                SUBMISSION_PARAM => submission_id = Some(value.into_owned()),
                RETURN_PARAM => return_url = Some(value.into_owned()),
                _ => {}
            }
        }
        let submission_id: SubmissionId = submission_id
            .ok_or(NavigationError::MissingParam(SUBMISSION_PARAM))?
            .parse()
            .map_err(|_| NavigationError::MissingParam(SUBMISSION_PARAM))?;
        let return_url = return_url.ok_or(NavigationError::MissingParam(RETURN_PARAM))?;

        Ok(Self {
            kind,
            item_id,
            submission_id,
            return_url,
        })
    }
}

fn percent_decode(segment: &str) -> String {
    // Path segments keep `+` literal; form decoding would turn it into a space.
    let escaped = segment.replace('+', "%2B");
    url::form_urlencoded::parse(format!("x={escaped}").as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_else(|| segment.to_owned())
}
