pub use super::animal::Entity as Animal;
pub use super::feeding_record::Entity as FeedingRecord;
pub use super::milk_record::Entity as MilkRecord;
pub use super::user::Entity as User;
