//! The dispatch table: (resource, operation) → request shape.
//!
//! Every supported pair is a [`Route`] variant, and [`Route::definition`]
//! is one exhaustive match, so adding a variant without describing its
//! request does not compile.

use crate::error::{DispatchError, DispatchResult};
use crate::params::Params;
use crate::transport::{HttpMethod, RequestDescriptor};
use serde_json::{Map, Value};
use std::fmt;
use url::Url;

/// The noun category an item operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Comment,
    Conversation,
    Contact,
    ContactGroup,
    Message,
    Draft,
    Tag,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Comment,
        Resource::Conversation,
        Resource::Contact,
        Resource::ContactGroup,
        Resource::Message,
        Resource::Draft,
        Resource::Tag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Comment => "comment",
            Resource::Conversation => "conversation",
            Resource::Contact => "contact",
            Resource::ContactGroup => "contactGroup",
            Resource::Message => "message",
            Resource::Draft => "draft",
            Resource::Tag => "tag",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Resource::Comment => "Comment",
            Resource::Conversation => "Conversation",
            Resource::Contact => "Contact",
            Resource::ContactGroup => "Contact Group",
            Resource::Message => "Message",
            Resource::Draft => "Draft",
            Resource::Tag => "Tag",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == value)
    }

    pub fn routes(self) -> impl Iterator<Item = Route> {
        Route::ALL.into_iter().filter(move |r| r.resource() == self)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a body field takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// A required, non-empty string parameter.
    Text(&'static str),
    /// An optional string parameter with a default.
    TextOr(&'static str, &'static str),
    /// A boolean parameter with a default.
    Flag(&'static str, bool),
    /// A required comma-separated identifier list.
    IdList(&'static str),
    /// A fixed value, not user supplied.
    Const(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Key in the outgoing JSON body.
    pub key: &'static str,
    pub source: FieldSource,
}

impl Field {
    const fn new(key: &'static str, source: FieldSource) -> Self {
        Self { key, source }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    None,
    /// The whole body is a free-text JSON parameter, `{}` when absent.
    Json(&'static str),
    /// A body assembled field by field.
    Fields(&'static [Field]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    None,
    /// Optional free-text JSON object sent as the query string.
    JsonFilter(&'static str),
}

/// The request shape of one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDef {
    pub resource: Resource,
    pub operation: &'static str,
    pub name: &'static str,
    pub method: HttpMethod,
    /// Path below the API base; `{param}` segments are substituted.
    pub path: &'static str,
    pub body: BodyShape,
    pub query: QueryShape,
}

impl RouteDef {
    fn new(
        resource: Resource,
        operation: &'static str,
        name: &'static str,
        method: HttpMethod,
        path: &'static str,
    ) -> Self {
        Self {
            resource,
            operation,
            name,
            method,
            path,
            body: BodyShape::None,
            query: QueryShape::None,
        }
    }

    fn body(mut self, body: BodyShape) -> Self {
        self.body = body;
        self
    }

    fn query(mut self, query: QueryShape) -> Self {
        self.query = query;
        self
    }

    /// Names of the `{param}` placeholders in the path, in order.
    pub fn path_params(&self) -> impl Iterator<Item = &'static str> {
        self.path.split('/').filter_map(placeholder)
    }
}

fn placeholder(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

const COMMENT_CREATE: &[Field] = &[
    Field::new("body", FieldSource::Text("body")),
    Field::new("is_pinned", FieldSource::Flag("is_pinned", false)),
];

const COMMENT_UPDATE: &[Field] = &[
    Field::new("body", FieldSource::Text("updateBody")),
    Field::new("is_pinned", FieldSource::Flag("updatePinned", false)),
];

const DISCUSSION_CREATE: &[Field] = &[
    Field::new("subject", FieldSource::Text("convSubject")),
    Field::new("body", FieldSource::Text("convBody")),
    Field::new("type", FieldSource::Const("discussion")),
];

const FOLLOWERS: &[Field] = &[Field::new("teammate_ids", FieldSource::IdList("followerIds"))];

const GROUP_CONTACTS: &[Field] = &[Field::new(
    "contact_ids",
    FieldSource::IdList("groupContactIds"),
)];

// TODO: take author_id from an input once hosts can supply a teammate ID;
// both message routes currently send it empty.
const MESSAGE_SEND: &[Field] = &[
    Field::new("author_id", FieldSource::Const("")),
    Field::new("subject", FieldSource::TextOr("messageSubject", "")),
    Field::new("body", FieldSource::Text("messageBody")),
    Field::new("to", FieldSource::IdList("messageTo")),
];

const MESSAGE_REPLY: &[Field] = &[
    Field::new("author_id", FieldSource::Const("")),
    Field::new("body", FieldSource::Text("messageBody")),
    Field::new("channel_id", FieldSource::Text("replyChannelId")),
];

/// One supported (resource, operation) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    CommentCreate,
    CommentGet,
    CommentUpdate,
    CommentListComments,
    CommentListMentions,

    ConversationGet,
    ConversationList,
    ConversationCreateDiscussion,
    ConversationUpdate,
    ConversationAddFollowers,
    ConversationRemoveFollowers,
    ConversationAddLinks,
    ConversationRemoveLinks,
    ConversationListMessages,
    ConversationListEvents,

    ContactList,
    ContactGet,
    ContactCreate,
    ContactUpdate,
    ContactDelete,
    ContactMerge,
    ContactAddHandle,
    ContactDeleteHandle,
    ContactGetNotes,
    ContactAddNote,

    ContactGroupList,
    ContactGroupCreate,
    ContactGroupDelete,
    ContactGroupListContacts,
    ContactGroupAddContacts,
    ContactGroupRemoveContacts,

    MessageGet,
    MessageGetSource,
    MessageSend,
    MessageSendReply,
    MessageImport,
    MessageReceiveCustom,
    MessageMarkSeen,

    DraftCreate,
    DraftList,
    DraftCreateReply,
    DraftDelete,
    DraftEdit,

    TagList,
    TagGet,
    TagCreate,
    TagUpdate,
    TagDelete,
    TagListConversations,
}

impl Route {
    pub const ALL: [Route; 49] = [
        Route::CommentCreate,
        Route::CommentGet,
        Route::CommentUpdate,
        Route::CommentListComments,
        Route::CommentListMentions,
        Route::ConversationGet,
        Route::ConversationList,
        Route::ConversationCreateDiscussion,
        Route::ConversationUpdate,
        Route::ConversationAddFollowers,
        Route::ConversationRemoveFollowers,
        Route::ConversationAddLinks,
        Route::ConversationRemoveLinks,
        Route::ConversationListMessages,
        Route::ConversationListEvents,
        Route::ContactList,
        Route::ContactGet,
        Route::ContactCreate,
        Route::ContactUpdate,
        Route::ContactDelete,
        Route::ContactMerge,
        Route::ContactAddHandle,
        Route::ContactDeleteHandle,
        Route::ContactGetNotes,
        Route::ContactAddNote,
        Route::ContactGroupList,
        Route::ContactGroupCreate,
        Route::ContactGroupDelete,
        Route::ContactGroupListContacts,
        Route::ContactGroupAddContacts,
        Route::ContactGroupRemoveContacts,
        Route::MessageGet,
        Route::MessageGetSource,
        Route::MessageSend,
        Route::MessageSendReply,
        Route::MessageImport,
        Route::MessageReceiveCustom,
        Route::MessageMarkSeen,
        Route::DraftCreate,
        Route::DraftList,
        Route::DraftCreateReply,
        Route::DraftDelete,
        Route::DraftEdit,
        Route::TagList,
        Route::TagGet,
        Route::TagCreate,
        Route::TagUpdate,
        Route::TagDelete,
        Route::TagListConversations,
    ];

    pub fn definition(&self) -> RouteDef {
        use HttpMethod::*;
        use Resource::*;

        match self {
            Route::CommentCreate => RouteDef::new(
                Comment,
                "create",
                "Create",
                Post,
                "/conversations/{conversationId}/comments",
            )
            .body(BodyShape::Fields(COMMENT_CREATE)),
            Route::CommentGet => RouteDef::new(Comment, "get", "Get", Get, "/comments/{commentId}"),
            Route::CommentUpdate => {
                RouteDef::new(Comment, "update", "Update", Patch, "/comments/{commentId}")
                    .body(BodyShape::Fields(COMMENT_UPDATE))
            }
            Route::CommentListComments => RouteDef::new(
                Comment,
                "listComments",
                "List Conversation Comments",
                Get,
                "/conversations/{convIdForComments}/comments",
            ),
            Route::CommentListMentions => RouteDef::new(
                Comment,
                "listMentions",
                "List Comment Mentions",
                Get,
                "/comments/{commentId}/mentions",
            ),

            Route::ConversationGet => RouteDef::new(
                Conversation,
                "get",
                "Get",
                Get,
                "/conversations/{conversationId}",
            ),
            Route::ConversationList => {
                RouteDef::new(Conversation, "list", "List", Get, "/conversations")
                    .query(QueryShape::JsonFilter("convFilter"))
            }
            Route::ConversationCreateDiscussion => RouteDef::new(
                Conversation,
                "createDiscussion",
                "Create Discussion",
                Post,
                "/conversations",
            )
            .body(BodyShape::Fields(DISCUSSION_CREATE)),
            Route::ConversationUpdate => RouteDef::new(
                Conversation,
                "update",
                "Update",
                Patch,
                "/conversations/{conversationId}",
            )
            .body(BodyShape::Json("convUpdateData")),
            Route::ConversationAddFollowers => RouteDef::new(
                Conversation,
                "addFollowers",
                "Add Followers",
                Post,
                "/conversations/{conversationId}/followers",
            )
            .body(BodyShape::Fields(FOLLOWERS)),
            Route::ConversationRemoveFollowers => RouteDef::new(
                Conversation,
                "removeFollowers",
                "Remove Followers",
                Delete,
                "/conversations/{conversationId}/followers",
            )
            .body(BodyShape::Fields(FOLLOWERS)),
            Route::ConversationAddLinks => RouteDef::new(
                Conversation,
                "addLinks",
                "Add Links",
                Post,
                "/conversations/{conversationId}/links",
            )
            .body(BodyShape::Json("linkData")),
            Route::ConversationRemoveLinks => RouteDef::new(
                Conversation,
                "removeLinks",
                "Remove Links",
                Delete,
                "/conversations/{conversationId}/links",
            )
            .body(BodyShape::Json("linkData")),
            Route::ConversationListMessages => RouteDef::new(
                Conversation,
                "listMessages",
                "List Messages",
                Get,
                "/conversations/{conversationId}/messages",
            ),
            Route::ConversationListEvents => RouteDef::new(
                Conversation,
                "listEvents",
                "List Events",
                Get,
                "/conversations/{conversationId}/events",
            ),

            Route::ContactList => RouteDef::new(Contact, "list", "List", Get, "/contacts"),
            Route::ContactGet => RouteDef::new(Contact, "get", "Get", Get, "/contacts/{contactId}"),
            Route::ContactCreate => RouteDef::new(Contact, "create", "Create", Post, "/contacts")
                .body(BodyShape::Json("contactData")),
            Route::ContactUpdate => {
                RouteDef::new(Contact, "update", "Update", Patch, "/contacts/{contactId}")
                    .body(BodyShape::Json("contactData"))
            }
            Route::ContactDelete => {
                RouteDef::new(Contact, "delete", "Delete", Delete, "/contacts/{contactId}")
            }
            Route::ContactMerge => RouteDef::new(Contact, "merge", "Merge", Post, "/contacts/merge")
                .body(BodyShape::Json("mergeData")),
            Route::ContactAddHandle => RouteDef::new(
                Contact,
                "addHandle",
                "Add Handle",
                Post,
                "/contacts/{contactId}/handles",
            )
            .body(BodyShape::Json("handleData")),
            Route::ContactDeleteHandle => RouteDef::new(
                Contact,
                "deleteHandle",
                "Delete Handle",
                Delete,
                "/contacts/{contactId}/handles",
            )
            .body(BodyShape::Json("handleData")),
            Route::ContactGetNotes => RouteDef::new(
                Contact,
                "getNotes",
                "Get Notes",
                Get,
                "/contacts/{contactId}/notes",
            ),
            Route::ContactAddNote => RouteDef::new(
                Contact,
                "addNote",
                "Add Note",
                Post,
                "/contacts/{contactId}/notes",
            )
            .body(BodyShape::Json("noteData")),

            Route::ContactGroupList => {
                RouteDef::new(ContactGroup, "list", "List", Get, "/contact_groups")
            }
            Route::ContactGroupCreate => {
                RouteDef::new(ContactGroup, "create", "Create", Post, "/contact_groups")
                    .body(BodyShape::Json("groupData"))
            }
            Route::ContactGroupDelete => RouteDef::new(
                ContactGroup,
                "delete",
                "Delete",
                Delete,
                "/contact_groups/{groupId}",
            ),
            Route::ContactGroupListContacts => RouteDef::new(
                ContactGroup,
                "listContacts",
                "List Group Contacts",
                Get,
                "/contact_groups/{groupId}/contacts",
            ),
            Route::ContactGroupAddContacts => RouteDef::new(
                ContactGroup,
                "addContacts",
                "Add Contacts",
                Post,
                "/contact_groups/{groupId}/contacts",
            )
            .body(BodyShape::Fields(GROUP_CONTACTS)),
            Route::ContactGroupRemoveContacts => RouteDef::new(
                ContactGroup,
                "removeContacts",
                "Remove Contacts",
                Delete,
                "/contact_groups/{groupId}/contacts",
            )
            .body(BodyShape::Fields(GROUP_CONTACTS)),

            Route::MessageGet => RouteDef::new(Message, "get", "Get", Get, "/messages/{messageId}"),
            Route::MessageGetSource => RouteDef::new(
                Message,
                "getSource",
                "Get Source",
                Get,
                "/messages/{messageId}/source",
            ),
            Route::MessageSend => RouteDef::new(
                Message,
                "send",
                "Send New Message",
                Post,
                "/channels/{channelId}/messages",
            )
            .body(BodyShape::Fields(MESSAGE_SEND)),
            Route::MessageSendReply => RouteDef::new(
                Message,
                "sendReply",
                "Send Reply",
                Post,
                "/conversations/{conversationId}/messages",
            )
            .body(BodyShape::Fields(MESSAGE_REPLY)),
            Route::MessageImport => RouteDef::new(
                Message,
                "import",
                "Import Message",
                Post,
                "/inboxes/{inboxId}/messages",
            )
            .body(BodyShape::Json("importMessageData")),
            Route::MessageReceiveCustom => RouteDef::new(
                Message,
                "receiveCustom",
                "Receive Custom Message",
                Post,
                "/channels/{channelId}/incoming_messages",
            )
            .body(BodyShape::Json("customMessageData")),
            Route::MessageMarkSeen => RouteDef::new(
                Message,
                "markSeen",
                "Mark as Seen",
                Post,
                "/messages/{messageId}/mark_seen",
            ),

            Route::DraftCreate => RouteDef::new(
                Draft,
                "create",
                "Create Draft",
                Post,
                "/conversations/{draftConversationId}/drafts",
            )
            .body(BodyShape::Json("draftData")),
            Route::DraftList => RouteDef::new(
                Draft,
                "list",
                "List Drafts",
                Get,
                "/conversations/{draftConversationId}/drafts",
            ),
            Route::DraftCreateReply => RouteDef::new(
                Draft,
                "createReply",
                "Create Draft Reply",
                Post,
                "/conversations/{draftConversationId}/drafts",
            )
            .body(BodyShape::Json("draftReplyData")),
            Route::DraftDelete => {
                RouteDef::new(Draft, "delete", "Delete Draft", Delete, "/drafts/{draftId}")
            }
            Route::DraftEdit => {
                RouteDef::new(Draft, "edit", "Edit Draft", Patch, "/drafts/{draftId}")
                    .body(BodyShape::Json("draftEditData"))
            }

            Route::TagList => RouteDef::new(Tag, "list", "List", Get, "/tags"),
            Route::TagGet => RouteDef::new(Tag, "get", "Get", Get, "/tags/{tagId}"),
            Route::TagCreate => RouteDef::new(Tag, "create", "Create", Post, "/tags")
                .body(BodyShape::Json("tagData")),
            Route::TagUpdate => RouteDef::new(Tag, "update", "Update", Patch, "/tags/{tagId}")
                .body(BodyShape::Json("tagData")),
            Route::TagDelete => RouteDef::new(Tag, "delete", "Delete", Delete, "/tags/{tagId}"),
            Route::TagListConversations => RouteDef::new(
                Tag,
                "listConversations",
                "List Conversations",
                Get,
                "/tags/{tagId}/conversations",
            ),
        }
    }

    pub fn resource(&self) -> Resource {
        self.definition().resource
    }

    pub fn operation(&self) -> &'static str {
        self.definition().operation
    }

    /// Looks up the route for a raw (resource, operation) pair.
    pub fn resolve(resource: &str, operation: &str) -> Result<Route, UnknownRoute> {
        let parsed = Resource::parse(resource)
            .ok_or_else(|| UnknownRoute::Resource(resource.to_string()))?;

        parsed
            .routes()
            .find(|r| r.operation() == operation)
            .ok_or_else(|| UnknownRoute::Operation {
                resource: parsed,
                operation: operation.to_string(),
            })
    }

    /// Builds the request for this route from the item's parameters.
    ///
    /// # Errors
    /// `MissingParameter` for absent required inputs, `MalformedInput` for
    /// unparseable JSON fields or values of the wrong type.
    pub fn build(&self, params: &Params<'_>, base: &Url) -> DispatchResult<RequestDescriptor> {
        let def = self.definition();
        let url = build_url(base, def.path, params)?;

        let body = match def.body {
            BodyShape::None => None,
            BodyShape::Json(param) => Some(params.json_or(param, Value::Object(Map::new()))?),
            BodyShape::Fields(fields) => Some(build_fields(fields, params)?),
        };

        let query = match def.query {
            QueryShape::None => None,
            QueryShape::JsonFilter(param) => match params.optional_json(param)? {
                None => None,
                Some(Value::Object(map)) if map.is_empty() => None,
                Some(Value::Object(map)) => Some(map),
                Some(_) => {
                    return Err(DispatchError::malformed(param, "expected a JSON object"));
                }
            },
        };

        Ok(RequestDescriptor {
            method: def.method,
            url,
            body,
            query,
        })
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let def = self.definition();
        write!(f, "{}.{}", def.resource, def.operation)
    }
}

/// A (resource, operation) pair with no entry in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnknownRoute {
    Resource(String),
    Operation { resource: Resource, operation: String },
}

impl fmt::Display for UnknownRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownRoute::Resource(resource) => {
                write!(f, "Resource \"{}\" not implemented", resource)
            }
            UnknownRoute::Operation {
                resource,
                operation,
            } => write!(
                f,
                "Operation \"{}\" not implemented for resource \"{}\"",
                operation, resource
            ),
        }
    }
}

fn build_url(base: &Url, template: &str, params: &Params<'_>) -> DispatchResult<Url> {
    let mut segments = Vec::new();
    for segment in template.trim_start_matches('/').split('/') {
        match placeholder(segment) {
            Some(name) => {
                let value = params.required_str(name)?;
                let value = value.trim();
                if value == "." || value == ".." {
                    return Err(DispatchError::malformed(name, "not a valid identifier"));
                }
                segments.push(value.to_string());
            }
            None => segments.push(segment.to_string()),
        }
    }

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| DispatchError::Config {
            key: "base_url".to_string(),
            reason: format!("\"{}\" cannot be used as a base URL", base),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn build_fields(fields: &[Field], params: &Params<'_>) -> DispatchResult<Value> {
    let mut body = Map::new();
    for field in fields {
        let value = match field.source {
            FieldSource::Text(param) => Value::String(params.required_str(param)?),
            FieldSource::TextOr(param, default) => Value::String(params.str_or(param, default)?),
            FieldSource::Flag(param, default) => Value::Bool(params.bool_or(param, default)?),
            FieldSource::IdList(param) => Value::from(params.id_list(param)?),
            FieldSource::Const(value) => Value::String(value.to_string()),
        };
        body.insert(field.key.to_string(), value);
    }
    Ok(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::InputItem;
    use serde_json::json;
    use std::collections::HashSet;

    fn base() -> Url {
        Url::parse("https://api.frontapp.com/").unwrap()
    }

    fn build(route: Route, item: &InputItem) -> DispatchResult<RequestDescriptor> {
        route.build(&Params::new(item), &base())
    }

    /// Supplies a plausible value for every input a route declares.
    fn full_item(route: Route) -> InputItem {
        let def = route.definition();
        let mut item = InputItem::new();
        for name in def.path_params() {
            item = item.with(name, format!("{}_1", name));
        }
        if let BodyShape::Fields(fields) = def.body {
            for field in fields {
                item = match field.source {
                    FieldSource::Text(p) | FieldSource::TextOr(p, _) => item.with(p, "text"),
                    FieldSource::Flag(p, _) => item.with(p, true),
                    FieldSource::IdList(p) => item.with(p, "a, b"),
                    FieldSource::Const(_) => item,
                };
            }
        }
        if let BodyShape::Json(p) = def.body {
            item = item.with(p, r#"{"k": "v"}"#);
        }
        item
    }

    #[test]
    fn test_table_is_complete_and_unique() {
        let keys: HashSet<(Resource, &str)> = Route::ALL
            .iter()
            .map(|r| (r.resource(), r.operation()))
            .collect();
        assert_eq!(keys.len(), Route::ALL.len());

        let per_resource: Vec<usize> = Resource::ALL.iter().map(|r| r.routes().count()).collect();
        assert_eq!(per_resource, vec![5, 10, 10, 6, 7, 5, 6]);
    }

    #[test]
    fn test_every_route_resolves_to_itself() {
        for route in Route::ALL {
            let def = route.definition();
            assert_eq!(
                Route::resolve(def.resource.as_str(), def.operation),
                Ok(route),
                "{}",
                route
            );
        }
    }

    #[test]
    fn test_every_route_builds_with_full_input() {
        for route in Route::ALL {
            let def = route.definition();
            let req = build(route, &full_item(route)).unwrap();
            assert_eq!(req.method, def.method, "{}", route);

            let expected_path = def
                .path
                .split('/')
                .map(|s| match placeholder(s) {
                    Some(name) => format!("{}_1", name),
                    None => s.to_string(),
                })
                .collect::<Vec<_>>()
                .join("/");
            assert_eq!(req.path(), expected_path, "{}", route);
            assert_eq!(req.body.is_some(), def.body != BodyShape::None, "{}", route);
        }
    }

    #[test]
    fn test_documented_endpoints() {
        let cases = [
            ("comment", "create", "POST", "/conversations/{conversationId}/comments"),
            ("comment", "listComments", "GET", "/conversations/{convIdForComments}/comments"),
            (
                "conversation",
                "removeFollowers",
                "DELETE",
                "/conversations/{conversationId}/followers",
            ),
            ("contact", "merge", "POST", "/contacts/merge"),
            ("contactGroup", "listContacts", "GET", "/contact_groups/{groupId}/contacts"),
            ("message", "receiveCustom", "POST", "/channels/{channelId}/incoming_messages"),
            ("message", "markSeen", "POST", "/messages/{messageId}/mark_seen"),
            ("draft", "edit", "PATCH", "/drafts/{draftId}"),
            ("tag", "listConversations", "GET", "/tags/{tagId}/conversations"),
        ];
        for (resource, operation, method, path) in cases {
            let def = Route::resolve(resource, operation).unwrap().definition();
            assert_eq!(def.method.as_str(), method);
            assert_eq!(def.path, path);
        }
    }

    #[test]
    fn test_unknown_routes() {
        let err = Route::resolve("inbox", "list").unwrap_err();
        assert_eq!(err.to_string(), "Resource \"inbox\" not implemented");

        let err = Route::resolve("tag", "archive").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Operation \"archive\" not implemented for resource \"tag\""
        );
    }

    #[test]
    fn test_tag_list() {
        let req = build(Route::TagList, &InputItem::new()).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url.as_str(), "https://api.frontapp.com/tags");
        assert_eq!(req.body, None);
        assert_eq!(req.query, None);
    }

    #[test]
    fn test_add_followers() {
        let item = InputItem::new()
            .with("conversationId", "cnv_1")
            .with("followerIds", "tea_1, tea_2");
        let req = build(Route::ConversationAddFollowers, &item).unwrap();

        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path(), "/conversations/cnv_1/followers");
        assert_eq!(req.body, Some(json!({"teammate_ids": ["tea_1", "tea_2"]})));
    }

    #[test]
    fn test_comment_create_defaults_unpinned() {
        let item = InputItem::new()
            .with("conversationId", "cnv_9")
            .with("body", "Looking into it");
        let req = build(Route::CommentCreate, &item).unwrap();
        assert_eq!(req.body, Some(json!({"body": "Looking into it", "is_pinned": false})));
    }

    #[test]
    fn test_message_send_body() {
        let item = InputItem::new()
            .with("channelId", "cha_1")
            .with("messageTo", "a@example.com, b@example.com")
            .with("messageBody", "Hello");
        let req = build(Route::MessageSend, &item).unwrap();

        assert_eq!(req.path(), "/channels/cha_1/messages");
        assert_eq!(
            req.body,
            Some(json!({
                "author_id": "",
                "subject": "",
                "body": "Hello",
                "to": ["a@example.com", "b@example.com"]
            }))
        );
    }

    #[test]
    fn test_discussion_has_fixed_type() {
        let item = InputItem::new()
            .with("convSubject", "Q3 planning")
            .with("convBody", "Kickoff");
        let req = build(Route::ConversationCreateDiscussion, &item).unwrap();
        assert_eq!(req.body.unwrap()["type"], "discussion");
    }

    #[test]
    fn test_missing_path_param() {
        let err = build(Route::TagGet, &InputItem::new()).unwrap_err();
        assert!(matches!(err, DispatchError::MissingParameter { ref name } if name == "tagId"));
    }

    #[test]
    fn test_malformed_json_body() {
        let item = InputItem::new().with("contactData", "{invalid");
        let err = build(Route::ContactCreate, &item).unwrap_err();
        assert!(
            matches!(err, DispatchError::MalformedInput { ref name, .. } if name == "contactData")
        );
    }

    #[test]
    fn test_absent_json_body_defaults_to_empty_object() {
        let req = build(Route::TagCreate, &InputItem::new()).unwrap();
        assert_eq!(req.body, Some(json!({})));
    }

    #[test]
    fn test_conversation_filter() {
        let empty = InputItem::new().with("convFilter", "");
        assert_eq!(build(Route::ConversationList, &empty).unwrap().query, None);

        let absent = InputItem::new();
        assert_eq!(build(Route::ConversationList, &absent).unwrap().query, None);

        let filter = InputItem::new().with("convFilter", r#"{"limit": 25}"#);
        let query = build(Route::ConversationList, &filter).unwrap().query.unwrap();
        assert_eq!(query.get("limit"), Some(&json!(25)));

        let not_object = InputItem::new().with("convFilter", "[1, 2]");
        assert!(build(Route::ConversationList, &not_object).is_err());
    }

    #[test]
    fn test_path_values_are_encoded() {
        let item = InputItem::new().with("contactId", "alt:email:jo@example.com/x");
        let req = build(Route::ContactGet, &item).unwrap();
        assert_eq!(req.url.path_segments().unwrap().count(), 2);
        assert!(req.path().starts_with("/contacts/alt:email:jo@example.com%2Fx"));

        let traversal = InputItem::new().with("contactId", "..");
        assert!(build(Route::ContactGet, &traversal).is_err());
    }

    #[test]
    fn test_base_with_prefix_path() {
        let base = Url::parse("http://127.0.0.1:8080/frontapp/").unwrap();
        let item = InputItem::new().with("tagId", "tag_1");
        let req = Route::TagGet.build(&Params::new(&item), &base).unwrap();
        assert_eq!(req.url.as_str(), "http://127.0.0.1:8080/frontapp/tags/tag_1");
    }
}
