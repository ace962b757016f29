//! Wire types shared with the REST backend
//!
//! Field names are camelCase on the wire.

pub mod auth;
pub mod chat;
pub mod project;
pub mod push;

pub use auth::{AuthResponse, LoginRequest, LogoutRequest, RefreshRequest, User};
pub use chat::{
    Contact, Conversation, CustomNameRequest, Direction, Message, MessageStatus, MessageType,
    SendMessageRequest,
};
pub use project::{CreateProjectData, Project, ProjectCount, UpdateProjectData};
pub use push::{
    Permission, PushSubscription, SubscribeRequest, SubscriptionKeys, SubscriptionOptions,
    UnsubscribeRequest, VapidKeyResponse,
};
