pub mod notification_run;
