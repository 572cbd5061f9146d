use std::str::FromStr;

#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    FEAT,
    OPTS,
    SYST,
    NOOP,
    ALLO,
    AUTH,
    PBSZ,
    PROT,
    TYPE,
    MODE,
    STRU,
    PWD,
    CWD,
    CDUP,
    MKD,
    RMD,
    DELE,
    RNFR,
    RNTO,
    SIZE,
    MDTM,
    LIST,
    NLST,
    RETR,
    STOR,
    APPE,
    PASV,
    EPSV,
    PORT,
    EPRT,
}

impl FromStr for FtpCommand {
    type Err = String;

    /// Parses an upper- or lower-case verb. The RFC 775 `X*` forms map to their modern names.
    fn from_str(cmd: &str) -> Result<Self, Self::Err> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Ok(FtpCommand::USER),
            "PASS" => Ok(FtpCommand::PASS),
            "QUIT" => Ok(FtpCommand::QUIT),
            "FEAT" => Ok(FtpCommand::FEAT),
            "OPTS" => Ok(FtpCommand::OPTS),
            "SYST" => Ok(FtpCommand::SYST),
            "NOOP" => Ok(FtpCommand::NOOP),
            "ALLO" => Ok(FtpCommand::ALLO),
            "AUTH" => Ok(FtpCommand::AUTH),
            "PBSZ" => Ok(FtpCommand::PBSZ),
            "PROT" => Ok(FtpCommand::PROT),
            "TYPE" => Ok(FtpCommand::TYPE),
            "MODE" => Ok(FtpCommand::MODE),
            "STRU" => Ok(FtpCommand::STRU),
            "PWD" | "XPWD" => Ok(FtpCommand::PWD),
            "CWD" | "XCWD" => Ok(FtpCommand::CWD),
            "CDUP" | "XCUP" => Ok(FtpCommand::CDUP),
            "MKD" | "XMKD" => Ok(FtpCommand::MKD),
            "RMD" | "XRMD" => Ok(FtpCommand::RMD),
            "DELE" => Ok(FtpCommand::DELE),
            "RNFR" => Ok(FtpCommand::RNFR),
            "RNTO" => Ok(FtpCommand::RNTO),
            "SIZE" => Ok(FtpCommand::SIZE),
            "MDTM" => Ok(FtpCommand::MDTM),
            "LIST" => Ok(FtpCommand::LIST),
            "NLST" => Ok(FtpCommand::NLST),
            "RETR" => Ok(FtpCommand::RETR),
            "STOR" => Ok(FtpCommand::STOR),
            "APPE" => Ok(FtpCommand::APPE),
            "PASV" => Ok(FtpCommand::PASV),
            "EPSV" => Ok(FtpCommand::EPSV),
            "PORT" => Ok(FtpCommand::PORT),
            "EPRT" => Ok(FtpCommand::EPRT),
            other => Err(other.to_string()),
        }
    }
}
