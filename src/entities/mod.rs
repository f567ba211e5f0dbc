//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod attendance;
pub mod category;
pub mod employee;
pub mod notification;
pub mod payroll;
pub mod site;
pub mod site_engineer;
pub mod user;

// Re-export specific types to avoid conflicts
pub use attendance::{
    Column as AttendanceColumn, Entity as Attendance, Model as AttendanceModel, PeriodType,
};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use employee::{Column as EmployeeColumn, Entity as Employee, Model as EmployeeModel};
pub use notification::{
    Column as NotificationColumn, Entity as Notification, Model as NotificationModel,
    NotificationType,
};
pub use payroll::{
    Column as PayrollColumn, Entity as Payroll, Model as PayrollModel, PaymentStatus,
};
pub use site::{Column as SiteColumn, Entity as Site, Model as SiteModel};
pub use site_engineer::{
    Column as SiteEngineerColumn, Entity as SiteEngineer, Model as SiteEngineerModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
