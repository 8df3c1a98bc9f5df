pub mod comment;
pub mod post;
pub mod user;

pub use comment::{Comment, CommentPatch, CommentWhere, NewComment};
pub use post::{NewPost, Post, PostPatch, PostWhere};
pub use user::{NewUser, User, UserPatch};
