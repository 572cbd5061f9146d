use crate::core_driver::Driver;
use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::core_ftpcommand::{
    auth, cwd, dele, feat, list, mdtm, mkd, noop, pass, pwd, quit, retr, rmd, rnfr, rnto, size,
    stor, syst, type_, user,
};
use crate::core_network::{pasv, port};
use crate::session::{Session, SessionError};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SessionError>> + Send + 'a>>;

/// A command handler gets exclusive access to the session and the raw parameter.
pub type CommandHandler<D> = for<'a> fn(&'a mut Session<D>, String) -> HandlerFuture<'a>;

pub struct CommandSpec<D: Driver> {
    pub handler: CommandHandler<D>,
    /// Rejected with 530 until the session has logged in.
    pub requires_auth: bool,
}

impl<D: Driver> CommandSpec<D> {
    fn public(handler: CommandHandler<D>) -> Self {
        Self {
            handler,
            requires_auth: false,
        }
    }

    fn protected(handler: CommandHandler<D>) -> Self {
        Self {
            handler,
            requires_auth: true,
        }
    }
}

pub type CommandTable<D> = HashMap<FtpCommand, CommandSpec<D>>;

/// Builds the dispatch table. Built once per server and shared by every session.
pub fn initialize_command_handlers<D: Driver>() -> CommandTable<D> {
    let mut handlers: CommandTable<D> = HashMap::new();

    // Allowed before login.
    handlers.insert(
        FtpCommand::USER,
        CommandSpec::public(|session, arg| Box::pin(user::handle_user_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::PASS,
        CommandSpec::public(|session, arg| Box::pin(pass::handle_pass_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::QUIT,
        CommandSpec::public(|session, arg| Box::pin(quit::handle_quit_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::FEAT,
        CommandSpec::public(|session, arg| Box::pin(feat::handle_feat_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::SYST,
        CommandSpec::public(|session, arg| Box::pin(syst::handle_syst_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::AUTH,
        CommandSpec::public(|session, arg| Box::pin(auth::handle_auth_command(session, arg))),
    );

    handlers.insert(
        FtpCommand::PBSZ,
        CommandSpec::protected(|session, arg| Box::pin(auth::handle_pbsz_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::PROT,
        CommandSpec::protected(|session, arg| Box::pin(auth::handle_prot_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::OPTS,
        CommandSpec::protected(|session, arg| Box::pin(feat::handle_opts_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::NOOP,
        CommandSpec::protected(|session, arg| Box::pin(noop::handle_noop_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::ALLO,
        CommandSpec::protected(|session, arg| Box::pin(noop::handle_allo_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::TYPE,
        CommandSpec::protected(|session, arg| Box::pin(type_::handle_type_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::MODE,
        CommandSpec::protected(|session, arg| Box::pin(type_::handle_mode_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::STRU,
        CommandSpec::protected(|session, arg| Box::pin(type_::handle_stru_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::PWD,
        CommandSpec::protected(|session, arg| Box::pin(pwd::handle_pwd_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::CWD,
        CommandSpec::protected(|session, arg| Box::pin(cwd::handle_cwd_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::CDUP,
        CommandSpec::protected(|session, arg| Box::pin(cwd::handle_cdup_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::MKD,
        CommandSpec::protected(|session, arg| Box::pin(mkd::handle_mkd_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::RMD,
        CommandSpec::protected(|session, arg| Box::pin(rmd::handle_rmd_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::DELE,
        CommandSpec::protected(|session, arg| Box::pin(dele::handle_dele_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::RNFR,
        CommandSpec::protected(|session, arg| Box::pin(rnfr::handle_rnfr_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::RNTO,
        CommandSpec::protected(|session, arg| Box::pin(rnto::handle_rnto_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::SIZE,
        CommandSpec::protected(|session, arg| Box::pin(size::handle_size_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::MDTM,
        CommandSpec::protected(|session, arg| Box::pin(mdtm::handle_mdtm_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::LIST,
        CommandSpec::protected(|session, arg| Box::pin(list::handle_list_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::NLST,
        CommandSpec::protected(|session, arg| Box::pin(list::handle_nlst_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::RETR,
        CommandSpec::protected(|session, arg| Box::pin(retr::handle_retr_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::STOR,
        CommandSpec::protected(|session, arg| Box::pin(stor::handle_stor_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::APPE,
        CommandSpec::protected(|session, arg| Box::pin(stor::handle_appe_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::PASV,
        CommandSpec::protected(|session, arg| Box::pin(pasv::handle_pasv_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::EPSV,
        CommandSpec::protected(|session, arg| Box::pin(pasv::handle_epsv_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::PORT,
        CommandSpec::protected(|session, arg| Box::pin(port::handle_port_command(session, arg))),
    );
    handlers.insert(
        FtpCommand::EPRT,
        CommandSpec::protected(|session, arg| Box::pin(port::handle_eprt_command(session, arg))),
    );

    handlers
}
