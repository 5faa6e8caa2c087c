pub mod chats;
pub mod moods;
