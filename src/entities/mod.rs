pub mod animal;
pub mod feeding_record;
pub mod milk_record;
pub mod user;

pub use animal::Entity as Animal;
pub use feeding_record::Entity as FeedingRecord;
pub use milk_record::Entity as MilkRecord;
pub use user::Entity as User;

pub mod prelude;
