#![forbid(unsafe_code)]

use crate::http::{HttpRequest, Response};
use crate::render;
use crate::server::{HandlerError, Server};
use bubbles_core::form::{
    BubbleForm, FIELD_CSRF_TOKEN, FIELD_DESCRIPTION, FIELD_WHEN_DUE, FormError, validate,
};
use bubbles_core::model::{ActiveGroups, Bubble, BubbleId, completed};
use serde::Serialize;

/// Where every successful form submission lands, including the one on `/popped`.
pub(crate) const AFTER_SUBMIT_LOCATION: &str = "/";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Listing {
    Active,
    Popped,
}

#[derive(Serialize)]
struct BubbleJson<'a> {
    id: i64,
    description: &'a str,
    when: &'a str,
    is_complete: bool,
}

impl<'a> From<&'a Bubble> for BubbleJson<'a> {
    fn from(bubble: &'a Bubble) -> Self {
        Self {
            id: bubble.id.get(),
            description: &bubble.description,
            when: bubble.due.label(),
            is_complete: bubble.is_complete,
        }
    }
}

#[derive(Serialize)]
struct BubbleListingJson<'a> {
    bubbles: Vec<BubbleJson<'a>>,
}

impl Server {
    pub(crate) fn show_listing(&mut self, listing: Listing) -> Result<Response, HandlerError> {
        self.render_listing(listing, &BubbleForm::fresh())
    }

    /// Create path shared by both listings: validate, insert, then redirect (post/redirect/get).
    /// A rejected submission re-renders the listing with the user's input and messages.
    pub(crate) fn submit_bubble(
        &mut self,
        request: &HttpRequest,
        listing: Listing,
    ) -> Result<Response, HandlerError> {
        let description = request.form_value(FIELD_DESCRIPTION);
        let malformed = description.is_err();
        let description = description.ok().flatten().unwrap_or_default();
        let when_due = request
            .form_value(FIELD_WHEN_DUE)
            .ok()
            .flatten()
            .unwrap_or_default();
        let token = request.form_value(FIELD_CSRF_TOKEN).ok().flatten();

        let mut errors = Vec::new();
        if !self.csrf.verify(token.as_deref(), crate::time::unix_ms()) {
            errors.push(FormError::InvalidCsrfToken);
        }
        if malformed {
            errors.push(FormError::DescriptionMalformed);
        }
        match validate(&description, &when_due) {
            Ok(valid) if errors.is_empty() => {
                self.store.create(&valid.description, valid.due)?;
                return Ok(Response::redirect(AFTER_SUBMIT_LOCATION));
            }
            Ok(_) => {}
            // An undecodable description is reported as such, not as a missing one.
            Err(err) => errors.extend(
                err.errors
                    .into_iter()
                    .filter(|error| !(malformed && *error == FormError::DescriptionRequired)),
            ),
        }

        let form = BubbleForm::rejected(&description, &when_due, errors);
        self.render_listing(listing, &form)
    }

    pub(crate) fn pop_bubble(&mut self, request: &HttpRequest) -> Result<Response, HandlerError> {
        let Some(id) = request
            .query_param("id")
            .as_deref()
            .and_then(BubbleId::parse)
        else {
            return Err(HandlerError::NotFound("Missing or invalid bubble id."));
        };
        // HEAD answers with the same redirect but leaves the bubble alone.
        if request.method == "HEAD" {
            self.store.get(id)?;
        } else {
            self.store.mark_complete(id)?;
        }
        Ok(Response::redirect("/"))
    }

    pub(crate) fn list_bubbles_json(&mut self) -> Result<Response, HandlerError> {
        let all = self.store.list_all()?;
        let listing = BubbleListingJson {
            bubbles: all.iter().map(BubbleJson::from).collect(),
        };
        Ok(Response::json(serde_json::to_string(&listing)?))
    }

    fn render_listing(
        &mut self,
        listing: Listing,
        form: &BubbleForm,
    ) -> Result<Response, HandlerError> {
        let all = self.store.list_all()?;
        let token = self.csrf.issue(crate::time::unix_ms());
        let page = match listing {
            Listing::Active => render::index_page(&ActiveGroups::partition(all), form, &token),
            Listing::Popped => render::popped_page(&completed(all), form, &token),
        };
        Ok(Response::html("200 OK", page))
    }
}
