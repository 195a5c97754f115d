//! インメモリの接続状態
//!
//! - `session`: コネクションとユーザーの対応（Session Registry）
//! - `room`: ルームとコネクションの対応（Room Membership）
//!
//! どちらもサーバーインスタンスごとに 1 つ生成し、UseCase へ注入します。

pub mod room;
pub mod session;

pub use room::RoomMembership;
pub use session::{Admission, Removal, SessionRegistry};
